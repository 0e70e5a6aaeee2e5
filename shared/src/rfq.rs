use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bids::Bid;
use crate::error::{RuleResult, RuleViolation};
use crate::item::DeliveryInfo;
use crate::units::Dimensions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqEnvelope {
    pub has_rfq: bool,
    pub revision_current: Option<i64>,
    #[serde(default)]
    pub revision_changed: bool,
    pub issued_at: Option<DateTime<Utc>>,
}

impl RfqEnvelope {
    pub fn issue(&mut self, at: DateTime<Utc>) {
        self.has_rfq = true;
        self.issued_at = Some(at);
    }

    /// Records an edit to dimensions or quantity. Once any bid was priced
    /// against a revision the counter moves forward, which makes those bids
    /// outdated. Returns the new revision when one was cut.
    pub fn record_spec_edit(&mut self, bids: &[Bid]) -> Option<i64> {
        let latest_bid_revision = bids.iter().filter_map(|bid| bid.revision_at_submit).max()?;
        let base = self.revision_current.unwrap_or(latest_bid_revision);
        let next = base.max(latest_bid_revision) + 1;
        self.revision_current = Some(next);
        self.revision_changed = true;
        Some(next)
    }

    /// Withdrawing the last bid returns the item to pre-RFQ.
    pub fn reset(&mut self) {
        self.has_rfq = false;
        self.issued_at = None;
        self.revision_changed = false;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfqSubmission {
    pub quantity: Option<i64>,
    pub dimensions: Dimensions,
    pub delivery: DeliveryInfo,
    #[serde(default)]
    pub invited_supplier_ids: Vec<i64>,
    #[serde(default)]
    pub auto_invite: bool,
}

impl RfqSubmission {
    pub fn validate(&self) -> RuleResult<()> {
        if !self.quantity.is_some_and(|quantity| quantity > 0) {
            return Err(RuleViolation::RfqMissingField("quantity"));
        }
        if !self.dimensions.is_complete() {
            return Err(RuleViolation::RfqMissingField("dimensions"));
        }
        if self.delivery.country.trim().is_empty() {
            return Err(RuleViolation::RfqMissingField("delivery country"));
        }
        if self.invited_supplier_ids.is_empty() && !self.auto_invite {
            return Err(RuleViolation::NoSuppliersInvited);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bids::fixtures::bid;
    use crate::units::DimensionUnit;

    fn submission() -> RfqSubmission {
        RfqSubmission {
            quantity: Some(10),
            dimensions: Dimensions::new(80.0, 60.0, 75.0, DimensionUnit::Cm),
            delivery: DeliveryInfo {
                country: "DE".to_string(),
                postal_code: Some("10115".to_string()),
            },
            invited_supplier_ids: vec![3],
            auto_invite: false,
        }
    }

    #[test]
    fn accepts_complete_submission() {
        assert_eq!(submission().validate(), Ok(()));
    }

    #[test]
    fn rejects_missing_fields() {
        let mut s = submission();
        s.quantity = Some(0);
        assert_eq!(s.validate(), Err(RuleViolation::RfqMissingField("quantity")));

        let mut s = submission();
        s.dimensions.h = None;
        assert_eq!(s.validate(), Err(RuleViolation::RfqMissingField("dimensions")));

        let mut s = submission();
        s.delivery.country = "  ".to_string();
        assert_eq!(s.validate(), Err(RuleViolation::RfqMissingField("delivery country")));
    }

    #[test]
    fn empty_invite_list_needs_auto_invite() {
        let mut s = submission();
        s.invited_supplier_ids.clear();
        assert_eq!(s.validate(), Err(RuleViolation::NoSuppliersInvited));
        s.auto_invite = true;
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn spec_edit_bumps_revision_only_with_versioned_bids() {
        let mut envelope = RfqEnvelope {
            has_rfq: true,
            revision_current: Some(1),
            ..Default::default()
        };
        let unversioned = vec![bid(1, 0)];
        assert_eq!(envelope.record_spec_edit(&unversioned), None);
        assert_eq!(envelope.revision_current, Some(1));
        assert!(!envelope.revision_changed);

        let mut versioned = bid(2, 1);
        versioned.revision_at_submit = Some(1);
        assert_eq!(envelope.record_spec_edit(&[versioned.clone()]), Some(2));
        assert_eq!(envelope.record_spec_edit(&[versioned]), Some(3));
        assert!(envelope.revision_changed);
    }
}
