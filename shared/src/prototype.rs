use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RuleResult, RuleViolation};
use crate::feedback::FeedbackPacket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrototypeStatus {
    #[default]
    NotSubmitted,
    Submitted,
    ChangesRequested,
    Approved,
}

impl fmt::Display for PrototypeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrototypeStatus::NotSubmitted => "not_submitted",
            PrototypeStatus::Submitted => "submitted",
            PrototypeStatus::ChangesRequested => "changes_requested",
            PrototypeStatus::Approved => "approved",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLink {
    pub provider: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypeSubmission {
    pub version: i64,
    pub links: Vec<MediaLink>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypeState {
    pub status: PrototypeStatus,
    pub current_version: i64,
    pub approved_version: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub submission: Option<PrototypeSubmission>,
    #[serde(default)]
    pub history: Vec<PrototypeSubmission>,
}

impl PrototypeState {
    fn review_guard(&self, action: &'static str, version: i64) -> RuleResult<()> {
        if self.status != PrototypeStatus::Submitted {
            return Err(RuleViolation::PrototypeTransition {
                action,
                status: self.status.to_string(),
            });
        }
        if version != self.current_version {
            return Err(RuleViolation::StalePrototypeVersion {
                requested: version,
                current: self.current_version,
            });
        }
        Ok(())
    }

    pub fn check_approve(&self, version: i64) -> RuleResult<()> {
        self.review_guard("approve", version)
    }

    pub fn approve(&mut self, version: i64, at: DateTime<Utc>) -> RuleResult<()> {
        self.check_approve(version)?;
        self.approved_version = Some(self.current_version);
        self.approved_at = Some(at);
        self.status = PrototypeStatus::Approved;
        Ok(())
    }

    pub fn check_request_changes(
        &self,
        version: i64,
        packet: &FeedbackPacket,
        tracked_keyword_ids: &[i64],
    ) -> RuleResult<()> {
        self.review_guard("request changes", version)?;
        packet.validate(tracked_keyword_ids)
    }

    pub fn request_changes(
        &mut self,
        version: i64,
        packet: &FeedbackPacket,
        tracked_keyword_ids: &[i64],
    ) -> RuleResult<()> {
        self.check_request_changes(version, packet, tracked_keyword_ids)?;
        self.status = PrototypeStatus::ChangesRequested;
        Ok(())
    }

    /// The version the supplier is expected to submit next.
    pub fn next_version(&self) -> i64 {
        self.current_version + 1
    }

    /// Supplier-originated; the client only observes the result.
    pub fn record_submission(&mut self, links: Vec<MediaLink>, at: DateTime<Utc>) -> RuleResult<i64> {
        if self.status == PrototypeStatus::Submitted {
            return Err(RuleViolation::PrototypeTransition {
                action: "submit",
                status: self.status.to_string(),
            });
        }
        self.current_version = self.next_version();
        let submission = PrototypeSubmission {
            version: self.current_version,
            links,
            submitted_at: at,
        };
        self.history.push(submission.clone());
        self.submission = Some(submission);
        self.status = PrototypeStatus::Submitted;
        Ok(self.current_version)
    }
}
