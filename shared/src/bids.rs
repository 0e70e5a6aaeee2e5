use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Number of bids shown side by side in the comparison view.
pub const COMPARISON_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Draft,
    Submitted,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMode {
    Sea,
    Air,
    Rail,
    Road,
    Courier,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidMedia {
    /// Video links keyed by provider ("youtube", "vimeo", ...).
    #[serde(default)]
    pub videos: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartAlternative {
    pub category: String,
    pub from_value: String,
    pub to_value: String,
    #[serde(default)]
    pub comparison_points: Vec<String>,
    pub price_impact: Option<String>,
    pub lead_time_impact: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub bid_id: i64,
    pub supplier_id: i64,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
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
    pub revision_at_submit: Option<i64>,
    #[serde(default)]
    pub is_awarded: bool,
    #[serde(default)]
    pub is_declined: bool,
    #[serde(default)]
    pub can_award: bool,
    pub awarded_at: Option<DateTime<Utc>>,
}

/// Single view over the three award flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardStanding {
    Awarded,
    Declined,
    Awardable,
    Pending,
}

impl Bid {
    pub fn is_submitted(&self) -> bool {
        self.status == BidStatus::Submitted
    }

    pub fn award_standing(&self) -> AwardStanding {
        if self.is_awarded {
            AwardStanding::Awarded
        } else if self.is_declined {
            AwardStanding::Declined
        } else if self.can_award {
            AwardStanding::Awardable
        } else {
            AwardStanding::Pending
        }
    }
}

/// Ascending submission time, ties broken by ascending bid id.
pub fn compare_bids(a: &Bid, b: &Bid) -> Ordering {
    a.submitted_at
        .cmp(&b.submitted_at)
        .then_with(|| a.bid_id.cmp(&b.bid_id))
}

pub fn sort_bids(bids: &mut [Bid]) {
    bids.sort_by(compare_bids);
}

pub fn ordered_bids(bids: &[Bid]) -> Vec<&Bid> {
    let mut ordered: Vec<&Bid> = bids.iter().collect();
    ordered.sort_by(|a, b| compare_bids(a, b));
    ordered
}

/// Spreadsheet-style labels: A..Z, AA, AB, ...
pub fn bid_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledBid<'a> {
    pub label: String,
    pub bid: &'a Bid,
}

pub fn labeled_bids(bids: &[Bid]) -> Vec<LabeledBid<'_>> {
    ordered_bids(bids)
        .into_iter()
        .enumerate()
        .map(|(index, bid)| LabeledBid {
            label: bid_label(index),
            bid,
        })
        .collect()
}

/// The first bids in display order; the rest stay addressable via
/// [`labeled_bids`].
pub fn comparison_window(bids: &[Bid]) -> Vec<LabeledBid<'_>> {
    let mut labeled = labeled_bids(bids);
    labeled.truncate(COMPARISON_LIMIT);
    labeled
}

#[derive(Debug, Default, PartialEq)]
pub struct RevisionPartition<'a> {
    pub current: Vec<&'a Bid>,
    pub outdated: Vec<&'a Bid>,
}

/// Splits submitted bids by the revision they were priced against. Bids
/// without a recorded revision while revision tracking is active fall in
/// neither partition.
pub fn partition_by_revision(bids: &[Bid], revision_current: Option<i64>) -> RevisionPartition<'_> {
    let mut partition = RevisionPartition::default();
    for bid in ordered_bids(bids).into_iter().filter(|bid| bid.is_submitted()) {
        match (revision_current, bid.revision_at_submit) {
            (None, _) => partition.current.push(bid),
            (Some(current), Some(at_submit)) if at_submit == current => partition.current.push(bid),
            (Some(_), Some(_)) => partition.outdated.push(bid),
            (Some(_), None) => {}
        }
    }
    partition
}


#[cfg(test)]
mod tests {
    use super::fixtures::bid;
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(bids: &[&Bid]) -> Vec<i64> {
        bids.iter().map(|bid| bid.bid_id).collect()
    }

    #[test]
    fn orders_by_time_then_id() {
        let bids = vec![bid(9, 5), bid(3, 5), bid(7, 1), bid(1, 30)];
        assert_eq!(ids(&ordered_bids(&bids)), vec![7, 3, 9, 1]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut bids = vec![bid(4, 2), bid(2, 2), bid(8, 0)];
        sort_bids(&mut bids);
        let once: Vec<i64> = bids.iter().map(|b| b.bid_id).collect();
        sort_bids(&mut bids);
        let twice: Vec<i64> = bids.iter().map(|b| b.bid_id).collect();
        assert_eq!(once, twice);
        assert_eq!(once, vec![8, 2, 4]);
    }

    #[test]
    fn labels_follow_order() {
        assert_eq!(bid_label(0), "A");
        assert_eq!(bid_label(25), "Z");
        assert_eq!(bid_label(26), "AA");
        assert_eq!(bid_label(27), "AB");

        let bids = vec![bid(5, 10), bid(6, 0)];
        let labeled = labeled_bids(&bids);
        assert_eq!(labeled[0].label, "A");
        assert_eq!(labeled[0].bid.bid_id, 6);
        assert_eq!(labeled[1].label, "B");
    }

    #[test]
    fn comparison_shows_first_three_only() {
        let bids = vec![bid(1, 0), bid(2, 1), bid(3, 2), bid(4, 3)];
        let window = comparison_window(&bids);
        assert_eq!(window.len(), 3);
        assert_eq!(window.last().map(|b| b.bid.bid_id), Some(3));
        assert_eq!(labeled_bids(&bids).len(), 4);
    }

    #[test]
    fn partitions_by_revision() {
        let mut current = bid(1, 0);
        current.revision_at_submit = Some(2);
        let mut outdated = bid(2, 1);
        outdated.revision_at_submit = Some(1);
        let untracked = bid(3, 2);
        let mut withdrawn = bid(4, 3);
        withdrawn.revision_at_submit = Some(1);
        withdrawn.status = BidStatus::Withdrawn;
        let bids = vec![current, outdated, untracked, withdrawn];

        let partition = partition_by_revision(&bids, Some(2));
        assert_eq!(ids(&partition.current), vec![1]);
        assert_eq!(ids(&partition.outdated), vec![2]);

        let untracked_partition = partition_by_revision(&bids, None);
        assert_eq!(ids(&untracked_partition.current), vec![1, 2, 3]);
        assert!(untracked_partition.outdated.is_empty());
    }

    #[test]
    fn standing_reflects_flags() {
        let mut b = bid(1, 0);
        assert_eq!(b.award_standing(), AwardStanding::Awardable);
        b.can_award = false;
        assert_eq!(b.award_standing(), AwardStanding::Pending);
        b.is_declined = true;
        assert_eq!(b.award_standing(), AwardStanding::Declined);
    }
}
