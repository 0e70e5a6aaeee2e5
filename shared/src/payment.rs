use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::bids::Bid;
use crate::error::{RuleResult, RuleViolation};

pub const CAD_FEE: &str = "60.00";

pub fn default_cad_fee() -> BigDecimal {
    BigDecimal::from_str(CAD_FEE).unwrap_or_else(|_| BigDecimal::from(60))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Requested,
    MarkedReceived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub item_id: i64,
    pub bid_id: i64,
    pub supplier_id: i64,
    pub status: PaymentStatus,
    pub total_due: BigDecimal,
    pub requested_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

/// CAD fee plus the bid's prototype cost (zero when the bid has none).
pub fn payment_total_due(cad_fee: &BigDecimal, bid: &Bid) -> BigDecimal {
    let prototype_cost = bid.prototype_cost.clone().unwrap_or_else(BigDecimal::zero);
    (cad_fee + prototype_cost).with_scale(2)
}

impl PaymentRecord {
    pub fn request(item_id: i64, bid: &Bid, cad_fee: &BigDecimal, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            bid_id: bid.bid_id,
            supplier_id: bid.supplier_id,
            status: PaymentStatus::Requested,
            total_due: payment_total_due(cad_fee, bid),
            requested_at: at,
            received_at: None,
        }
    }

    pub fn mark_received(&mut self, at: DateTime<Utc>) {
        if self.status == PaymentStatus::Requested {
            self.status = PaymentStatus::MarkedReceived;
            self.received_at = Some(at);
        }
    }
}

/// CAD drafting and prototype work stay closed until payment is received.
pub fn ensure_work_authorized(payment: Option<&PaymentRecord>) -> RuleResult<&PaymentRecord> {
    let payment = payment.ok_or(RuleViolation::PaymentMissing)?;
    match payment.status {
        PaymentStatus::MarkedReceived => Ok(payment),
        PaymentStatus::Requested => Err(RuleViolation::PaymentNotReceived),
    }
}

pub fn is_work_authorized(payment: Option<&PaymentRecord>) -> bool {
    ensure_work_authorized(payment).is_ok()
}
