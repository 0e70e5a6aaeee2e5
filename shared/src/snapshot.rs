use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::award::awarded_bid;
use crate::bids::{ordered_bids, partition_by_revision, Bid, RevisionPartition};
use crate::cad::CadState;
use crate::item::{Editability, Item, ItemMetrics, MacroState};
use crate::payment::{is_work_authorized, PaymentRecord};
use crate::prototype::PrototypeState;
use crate::rfq::RfqEnvelope;

/// Everything the backend knows about one item, as returned by
/// `get_item_state`. Derived values are computed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item: Item,
    pub rfq: RfqEnvelope,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub cad: CadState,
    #[serde(default)]
    pub prototype: PrototypeState,
    pub payment: Option<PaymentRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl ItemSnapshot {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            rfq: RfqEnvelope::default(),
            bids: Vec::new(),
            cad: CadState::default(),
            prototype: PrototypeState::default(),
            payment: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn item_id(&self) -> i64 {
        self.item.id
    }

    pub fn has_bids(&self) -> bool {
        self.bids.iter().any(Bid::is_submitted)
    }

    pub fn macro_state(&self) -> MacroState {
        MacroState::from_flags(self.rfq.has_rfq, self.has_bids())
    }

    pub fn editability(&self) -> Editability {
        Editability::derive(self.macro_state(), self.payment.is_some())
    }

    pub fn metrics(&self) -> ItemMetrics {
        self.item.metrics()
    }

    pub fn ordered_bids(&self) -> Vec<&Bid> {
        ordered_bids(&self.bids)
    }

    pub fn revision_partition(&self) -> RevisionPartition<'_> {
        partition_by_revision(&self.bids, self.rfq.revision_current)
    }

    pub fn bid(&self, bid_id: i64) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.bid_id == bid_id)
    }

    pub fn awarded_bid(&self) -> Option<&Bid> {
        awarded_bid(&self.bids)
    }

    pub fn work_authorized(&self) -> bool {
        is_work_authorized(self.payment.as_ref())
    }
}
