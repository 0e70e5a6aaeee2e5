use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RuleResult, RuleViolation};

pub const DEFAULT_REVISION_ROUNDS: i64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadStatus {
    #[default]
    None,
    Uploaded,
    RevisionRequested,
    Approved,
    Released,
}

impl fmt::Display for CadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CadStatus::None => "none",
            CadStatus::Uploaded => "uploaded",
            CadStatus::RevisionRequested => "revision_requested",
            CadStatus::Approved => "approved",
            CadStatus::Released => "released",
        };
        f.write_str(name)
    }
}

/// A file reference handed over by the upload layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadState {
    pub status: CadStatus,
    pub current_version: i64,
    pub approved_version: Option<i64>,
    pub revision_rounds_included: i64,
    pub revision_rounds_used: i64,
    pub approved_at: Option<DateTime<Utc>>,
    pub released_to_supplier_at: Option<DateTime<Utc>>,
}

impl Default for CadState {
    fn default() -> Self {
        Self {
            status: CadStatus::None,
            current_version: 0,
            approved_version: None,
            revision_rounds_included: DEFAULT_REVISION_ROUNDS,
            revision_rounds_used: 0,
            approved_at: None,
            released_to_supplier_at: None,
        }
    }
}

impl CadState {
    fn transition_error(&self, action: &'static str) -> RuleViolation {
        RuleViolation::CadTransition {
            action,
            status: self.status.to_string(),
        }
    }

    pub fn rounds_remaining(&self) -> i64 {
        (self.revision_rounds_included - self.revision_rounds_used).max(0)
    }

    pub fn check_request_revision(&self, files: &[Attachment]) -> RuleResult<()> {
        if files.is_empty() {
            return Err(RuleViolation::NoRevisionFiles);
        }
        match self.status {
            CadStatus::Uploaded | CadStatus::RevisionRequested => Ok(()),
            _ => Err(self.transition_error("request revision")),
        }
    }

    pub fn request_revision(&mut self, files: &[Attachment]) -> RuleResult<()> {
        self.check_request_revision(files)?;
        self.revision_rounds_used += 1;
        self.status = CadStatus::RevisionRequested;
        Ok(())
    }

    pub fn check_approve(&self) -> RuleResult<()> {
        if self.approved_version == Some(self.current_version) {
            return Err(RuleViolation::CadAlreadyApproved(self.current_version));
        }
        match self.status {
            CadStatus::Uploaded | CadStatus::RevisionRequested if self.current_version > 0 => Ok(()),
            _ => Err(self.transition_error("approve")),
        }
    }

    pub fn approve(&mut self, at: DateTime<Utc>) -> RuleResult<()> {
        self.check_approve()?;
        self.approved_version = Some(self.current_version);
        self.approved_at = Some(at);
        self.status = CadStatus::Approved;
        Ok(())
    }

    pub fn check_release(&self) -> RuleResult<()> {
        match self.status {
            CadStatus::Approved => Ok(()),
            _ => Err(self.transition_error("release")),
        }
    }

    pub fn release(&mut self, at: DateTime<Utc>) -> RuleResult<()> {
        self.check_release()?;
        self.released_to_supplier_at = Some(at);
        self.status = CadStatus::Released;
        Ok(())
    }

    /// Supplier-side upload of a new drawing version.
    pub fn record_upload(&mut self) -> RuleResult<i64> {
        match self.status {
            CadStatus::None | CadStatus::Uploaded | CadStatus::RevisionRequested => {
                self.current_version += 1;
                self.status = CadStatus::Uploaded;
                Ok(self.current_version)
            }
            _ => Err(self.transition_error("upload")),
        }
    }
}
