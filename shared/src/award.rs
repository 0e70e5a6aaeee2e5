use chrono::{DateTime, Utc};

use crate::bids::Bid;
use crate::error::{RuleResult, RuleViolation};

pub fn awarded_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().find(|bid| bid.is_awarded)
}

pub fn ensure_awardable(bids: &[Bid], bid_id: i64) -> RuleResult<()> {
    let target = bids
        .iter()
        .find(|bid| bid.bid_id == bid_id)
        .ok_or(RuleViolation::BidNotFound(bid_id))?;
    if target.is_awarded {
        return Err(RuleViolation::AlreadyAwarded(bid_id));
    }
    if let Some(existing) = awarded_bid(bids) {
        return Err(RuleViolation::AwardExists(existing.bid_id));
    }
    if !target.can_award || target.is_declined || !target.is_submitted() {
        return Err(RuleViolation::NotAwardable(bid_id));
    }
    Ok(())
}

/// Awards one bid and declines every sibling in a single step. Validation
/// runs before any flag is touched.
pub fn apply_award(bids: &mut [Bid], bid_id: i64, at: DateTime<Utc>) -> RuleResult<()> {
    ensure_awardable(bids, bid_id)?;
    for bid in bids.iter_mut() {
        bid.can_award = false;
        if bid.bid_id == bid_id {
            bid.is_awarded = true;
            bid.awarded_at = Some(at);
        } else {
            bid.is_declined = true;
        }
    }
    Ok(())
}

/// Whether the award flags across a bid set are mutually consistent: at most
/// one award and, when there is one, every sibling declined.
pub fn award_is_consistent(bids: &[Bid]) -> bool {
    let awarded: Vec<&Bid> = bids.iter().filter(|bid| bid.is_awarded).collect();
    match awarded.as_slice() {
        [] => true,
        [winner] => bids
            .iter()
            .filter(|bid| bid.bid_id != winner.bid_id)
            .all(|bid| bid.is_declined),
        _ => false,
    }
}
