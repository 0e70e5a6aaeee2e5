use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cad::Attachment;
use crate::feedback::FeedbackPacket;
use crate::rfq::RfqSubmission;

/// Externally tagged: integer-keyed feedback maps do not survive serde's
/// buffered decoding of internally tagged enums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SubmitRfq(RfqSubmission),
    AwardBid {
        bid_id: i64,
    },
    RequestCadAndPrototype {
        bid_id: i64,
    },
    RequestCadRevision {
        payment_id: Uuid,
        files: Vec<Attachment>,
    },
    ApproveCad {
        payment_id: Uuid,
    },
    ReleaseCad {
        payment_id: Uuid,
    },
    ApprovePrototype {
        payment_id: Uuid,
        bid_id: i64,
        version: i64,
    },
    RequestPrototypeChanges {
        payment_id: Uuid,
        bid_id: i64,
        version: i64,
        packet: FeedbackPacket,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SubmitRfq(_) => "submit_rfq",
            Intent::AwardBid { .. } => "award_bid",
            Intent::RequestCadAndPrototype { .. } => "request_cad_and_prototype",
            Intent::RequestCadRevision { .. } => "request_cad_revision",
            Intent::ApproveCad { .. } => "approve_cad",
            Intent::ReleaseCad { .. } => "release_cad",
            Intent::ApprovePrototype { .. } => "approve_prototype",
            Intent::RequestPrototypeChanges { .. } => "request_prototype_changes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: Uuid,
    pub item_id: i64,
    pub intent: Intent,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

impl Command {
    pub fn new(item_id: i64, intent: Intent) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            item_id,
            idempotency_key: format!("{}_{}_{}", item_id, intent.name(), id),
            intent,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub id: Uuid,
    pub command_id: Uuid,
    pub item_id: i64,
    pub status: CommandStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CommandReply {
    pub fn success(command: &Command, message: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            command_id: command.id,
            item_id: command.item_id,
            status: CommandStatus::Success,
            message,
            created_at: Utc::now(),
        }
    }

    pub fn failed(command: &Command, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            command_id: command.id,
            item_id: command.item_id,
            status: CommandStatus::Failed,
            message: Some(message.into()),
            created_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
