use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RuleResult, RuleViolation};

pub const MAX_PHRASES_PER_KEYWORD: usize = 3;
pub const MAX_TOTAL_PHRASES: usize = 18;
pub const MAX_REVISION_DETAIL_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Satisfied,
    NeedsAdjustment,
    NotAddressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    MustFix,
    ShouldFix,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFeedback {
    pub status: FeedbackStatus,
    pub severity: Option<Severity>,
    #[serde(default)]
    pub phrase_ids: BTreeSet<i64>,
    #[serde(default)]
    pub revision_detail: String,
}

impl KeywordFeedback {
    pub fn satisfied() -> Self {
        Self {
            status: FeedbackStatus::Satisfied,
            severity: None,
            phrase_ids: BTreeSet::new(),
            revision_detail: String::new(),
        }
    }

    pub fn needs_adjustment(severity: Severity, phrase_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            status: FeedbackStatus::NeedsAdjustment,
            severity: Some(severity),
            phrase_ids: phrase_ids.into_iter().collect(),
            revision_detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.revision_detail = detail.into();
        self
    }
}

/// Changes-requested payload for a prototype, keyed by keyword id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackPacket(pub BTreeMap<i64, KeywordFeedback>);

impl FeedbackPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword_id: i64, feedback: KeywordFeedback) -> &mut Self {
        self.0.insert(keyword_id, feedback);
        self
    }

    pub fn total_phrases(&self) -> usize {
        self.0.values().map(|feedback| feedback.phrase_ids.len()).sum()
    }

    /// The packet must cover exactly the tracked keywords.
    pub fn validate(&self, tracked_keyword_ids: &[i64]) -> RuleResult<()> {
        let tracked: BTreeSet<i64> = tracked_keyword_ids.iter().copied().collect();

        if let Some(missing) = tracked.iter().find(|id| !self.0.contains_key(id)) {
            return Err(RuleViolation::FeedbackMissingKeyword(*missing));
        }
        if let Some(unknown) = self.0.keys().find(|id| !tracked.contains(id)) {
            return Err(RuleViolation::FeedbackUnknownKeyword(*unknown));
        }

        for (keyword_id, feedback) in &self.0 {
            let count = feedback.phrase_ids.len();
            if feedback.status == FeedbackStatus::Satisfied && count > 0 {
                return Err(RuleViolation::SatisfiedWithPhrases(*keyword_id));
            }
            if count > MAX_PHRASES_PER_KEYWORD {
                return Err(RuleViolation::TooManyPhrasesForKeyword {
                    keyword_id: *keyword_id,
                    count,
                    max: MAX_PHRASES_PER_KEYWORD,
                });
            }
            let len = feedback.revision_detail.chars().count();
            if len > MAX_REVISION_DETAIL_CHARS {
                return Err(RuleViolation::RevisionDetailTooLong {
                    keyword_id: *keyword_id,
                    len,
                    max: MAX_REVISION_DETAIL_CHARS,
                });
            }
        }

        let total = self.total_phrases();
        if total > MAX_TOTAL_PHRASES {
            return Err(RuleViolation::TooManyPhrases {
                count: total,
                max: MAX_TOTAL_PHRASES,
            });
        }
        Ok(())
    }
}
