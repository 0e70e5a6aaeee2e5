use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingType {
    Furniture,
    GlobalSourcing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineType {
    #[serde(rename = "furniture_6_step")]
    Furniture6Step,
    #[serde(rename = "sourcing_4_step")]
    Sourcing4Step,
}

/// Furniture is checked first, so no entry here may be a substring of a
/// sourcing keyword ("table" would swallow "tableware").
const FURNITURE_KEYWORDS: &[&str] = &[
    "furniture",
    "sofa",
    "couch",
    "chair",
    "armchair",
    "stool",
    "bench",
    "ottoman",
    "dining table",
    "side table",
    "coffee table",
    "end table",
    "tables",
    "desk",
    "bed frame",
    "bedframe",
    "daybed",
    "bunk bed",
    "headboard",
    "cabinet",
    "sideboard",
    "credenza",
    "dresser",
    "wardrobe",
    "nightstand",
    "bookcase",
    "shelving",
    "console",
    "upholster",
];

const SOURCING_KEYWORDS: &[&str] = &[
    "electronic",
    "lighting",
    "lamp",
    "fixture",
    "textile",
    "fabric",
    "rug",
    "carpet",
    "hardware",
    "decor",
    "accessor",
    "ceramic",
    "glassware",
    "tableware",
    "kitchenware",
    "appliance",
    "packaging",
    "apparel",
    "sourcing",
];

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

/// First matching rule wins: category beats description, furniture beats
/// sourcing within the same field, and anything unmatched is furniture.
pub fn infer_sourcing_type(category: &str, description: &str) -> SourcingType {
    if contains_any(category, FURNITURE_KEYWORDS) {
        SourcingType::Furniture
    } else if contains_any(category, SOURCING_KEYWORDS) {
        SourcingType::GlobalSourcing
    } else if contains_any(description, FURNITURE_KEYWORDS) {
        SourcingType::Furniture
    } else if contains_any(description, SOURCING_KEYWORDS) {
        SourcingType::GlobalSourcing
    } else {
        SourcingType::Furniture
    }
}

pub fn timeline_type(sourcing_type: SourcingType) -> TimelineType {
    match sourcing_type {
        SourcingType::Furniture => TimelineType::Furniture6Step,
        SourcingType::GlobalSourcing => TimelineType::Sourcing4Step,
    }
}

const CATEGORY_TIMELINE_LABELS: &[(&str, &str)] = &[
    ("outdoor", "Outdoor furniture production"),
    ("upholster", "Upholstered furniture production"),
    ("furniture", "Furniture production"),
    ("lighting", "Lighting sourcing"),
    ("textile", "Textile sourcing"),
    ("rug", "Textile sourcing"),
    ("decor", "Decor sourcing"),
    ("electronic", "Electronics sourcing"),
];

/// Descriptive label shown next to a category. Display only: it never feeds
/// back into [`infer_sourcing_type`].
pub fn timeline_label_for_category(category: &str) -> &'static str {
    let category = category.to_lowercase();
    CATEGORY_TIMELINE_LABELS
        .iter()
        .find(|(keyword, _)| category.contains(keyword))
        .map(|(_, label)| *label)
        .unwrap_or("General sourcing")
}
