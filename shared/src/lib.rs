pub mod award;
pub mod bids;
pub mod cad;
pub mod classification;
pub mod command;
pub mod error;
pub mod feedback;
pub mod item;
pub mod payment;
pub mod prototype;
pub mod rfq;
pub mod snapshot;
pub mod timeline;
pub mod units;

pub use award::{apply_award, award_is_consistent, awarded_bid, ensure_awardable};
pub use bids::{
    bid_label, comparison_window, compare_bids, labeled_bids, ordered_bids, partition_by_revision,
    sort_bids, AwardStanding, Bid, BidMedia, BidStatus, LabeledBid, RevisionPartition,
    ShippingMode, SmartAlternative, COMPARISON_LIMIT,
};
pub use cad::{Attachment, CadState, CadStatus};
pub use classification::{
    infer_sourcing_type, timeline_label_for_category, timeline_type, SourcingType, TimelineType,
};
pub use command::{Command, CommandReply, CommandStatus, ErrorResponse, Intent};
pub use error::{RuleResult, RuleViolation};
pub use feedback::{
    FeedbackPacket, FeedbackStatus, KeywordFeedback, Severity, MAX_PHRASES_PER_KEYWORD,
    MAX_REVISION_DETAIL_CHARS, MAX_TOTAL_PHRASES,
};
pub use item::{
    DeliveryInfo, Editability, InspirationKind, InspirationRef, Item, ItemField, ItemMetrics,
    Keyword, MacroState, SmartAlternativesOptIn,
};
pub use payment::{
    default_cad_fee, CAD_FEE, ensure_work_authorized, is_work_authorized, payment_total_due, PaymentRecord,
    PaymentStatus,
};
pub use prototype::{MediaLink, PrototypeState, PrototypeStatus, PrototypeSubmission};
pub use rfq::{RfqEnvelope, RfqSubmission};
pub use snapshot::ItemSnapshot;
pub use timeline::{EvidenceKind, EvidenceRecord, StepKey, StepStatus, Timeline, TimelineStep};
pub use units::{
    cbm_per_unit, normalize_to_cm, parse_dimension, total_cbm, DimensionUnit, Dimensions, DimsCm,
};
