use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::*;
use uuid::Uuid;

/// Authoritative state for one item plus the bookkeeping the snapshot
/// itself does not carry.
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub snapshot: ItemSnapshot,
    pub invited_supplier_ids: Vec<i64>,
    pub auto_invite: bool,
    pub cad_uploads: Vec<EvidenceRecord>,
    pub feedback: Vec<FeedbackEntry>,
}

impl ItemRecord {
    pub fn new(item: Item) -> Self {
        Self {
            snapshot: ItemSnapshot::new(item),
            invited_supplier_ids: Vec::new(),
            auto_invite: false,
            cad_uploads: Vec::new(),
            feedback: Vec::new(),
        }
    }

    pub fn item_id(&self) -> i64 {
        self.snapshot.item_id()
    }

    pub fn to_snapshot(&self) -> ItemSnapshot {
        let mut snapshot = self.snapshot.clone();
        shared::sort_bids(&mut snapshot.bids);
        snapshot.fetched_at = Utc::now();
        snapshot
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::build(&self.snapshot, self.cad_uploads.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub version: i64,
    pub bid_id: i64,
    pub packet: FeedbackPacket,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProcessedCommand {
    pub idempotency_key: String,
    pub command_id: Uuid,
    pub reply: CommandReply,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecEditRequest {
    pub quantity: Option<i64>,
    pub dimensions: Option<Dimensions>,
    pub supplier_notes: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<Keyword>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBidRequest {
    pub supplier_id: i64,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub quantity_basis: Option<i64>,
    pub production_lead_time_days: Option<i64>,
    pub delivery_cost: Option<BigDecimal>,
    pub shipping_mode: Option<ShippingMode>,
    #[serde(default)]
    pub prototype_offered: bool,
    pub prototype_cost: Option<BigDecimal>,
    pub prototype_lead_time_days: Option<i64>,
    #[serde(default)]
    pub media: BidMedia,
    pub smart_alternative: Option<SmartAlternative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CadUploadRequest {
    pub files: Vec<Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrototypeSubmissionRequest {
    pub links: Vec<MediaLink>,
}
