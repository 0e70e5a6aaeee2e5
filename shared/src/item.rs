use serde::{Deserialize, Serialize};

use crate::classification::{infer_sourcing_type, timeline_type, SourcingType, TimelineType};
use crate::error::{RuleResult, RuleViolation};
use crate::units::{total_cbm, Dimensions, DimsCm};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub country: String,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspirationKind {
    Image,
    Link,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspirationRef {
    pub id: i64,
    pub url: String,
    pub kind: InspirationKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartAlternativesOptIn {
    pub enabled: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub quantity: Option<i64>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub delivery: DeliveryInfo,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub inspirations: Vec<InspirationRef>,
    #[serde(default)]
    pub smart_alternatives: SmartAlternativesOptIn,
    pub supplier_notes: Option<String>,
}

/// Values recomputed from an [`Item`] on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemMetrics {
    pub dims_cm: DimsCm,
    pub cbm: Option<f64>,
    pub total_cbm: Option<f64>,
    pub sourcing_type: SourcingType,
    pub timeline_type: TimelineType,
}

impl Item {
    pub fn metrics(&self) -> ItemMetrics {
        let dims_cm = self.dimensions.to_cm();
        let cbm = dims_cm.cbm();
        let sourcing_type = infer_sourcing_type(&self.category, &self.description);
        ItemMetrics {
            dims_cm,
            cbm,
            total_cbm: total_cbm(cbm, self.quantity),
            sourcing_type,
            timeline_type: timeline_type(sourcing_type),
        }
    }

    pub fn keyword_ids(&self) -> Vec<i64> {
        self.keywords.iter().map(|keyword| keyword.id).collect()
    }
}

/// Item-level workflow position: A, B or C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroState {
    PreRfq,
    RfqIssued,
    BidsReceived,
}

impl MacroState {
    /// Bids dominate the RFQ flag: an item with bids is in C even if
    /// `has_rfq` is momentarily false. Product decision, still to be confirmed.
    pub fn from_flags(has_rfq: bool, has_bids: bool) -> Self {
        if has_bids {
            MacroState::BidsReceived
        } else if has_rfq {
            MacroState::RfqIssued
        } else {
            MacroState::PreRfq
        }
    }

    pub fn letter(self) -> char {
        match self {
            MacroState::PreRfq => 'A',
            MacroState::RfqIssued => 'B',
            MacroState::BidsReceived => 'C',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Category,
    Description,
    Quantity,
    Dimensions,
    Delivery,
    Keywords,
    Inspirations,
    SmartAlternatives,
    SupplierNotes,
}

impl ItemField {
    pub fn name(self) -> &'static str {
        match self {
            ItemField::Category => "category",
            ItemField::Description => "description",
            ItemField::Quantity => "quantity",
            ItemField::Dimensions => "dimensions",
            ItemField::Delivery => "delivery",
            ItemField::Keywords => "keywords",
            ItemField::Inspirations => "inspirations",
            ItemField::SmartAlternatives => "smart_alternatives",
            ItemField::SupplierNotes => "supplier_notes",
        }
    }

    fn is_spec(self) -> bool {
        matches!(
            self,
            ItemField::Quantity | ItemField::Dimensions | ItemField::SupplierNotes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Editability {
    Full,
    SpecsOnly,
    Locked,
}

impl Editability {
    /// Any payment record locks the item, whatever the macro-state.
    pub fn derive(state: MacroState, has_payment: bool) -> Self {
        if has_payment {
            Editability::Locked
        } else if state == MacroState::PreRfq {
            Editability::Full
        } else {
            Editability::SpecsOnly
        }
    }

    pub fn allows(self, field: ItemField) -> bool {
        match self {
            Editability::Full => true,
            Editability::SpecsOnly => field.is_spec(),
            Editability::Locked => false,
        }
    }

    pub fn ensure(self, field: ItemField) -> RuleResult<()> {
        if self.allows(field) {
            Ok(())
        } else {
            Err(RuleViolation::FieldLocked(field.name()))
        }
    }
}
