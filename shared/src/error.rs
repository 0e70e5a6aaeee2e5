use thiserror::Error;

pub type RuleResult<T> = Result<T, RuleViolation>;

/// Workflow rule failures. The client checks them before sending a command
/// and the service checks them again before committing one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("RFQ is missing required field: {0}")]
    RfqMissingField(&'static str),

    #[error("Invite at least one supplier or enable auto-invite")]
    NoSuppliersInvited,

    #[error("Item field '{0}' is locked")]
    FieldLocked(&'static str),

    #[error("Bid {0} not found")]
    BidNotFound(i64),

    #[error("Bid {0} is already awarded")]
    AlreadyAwarded(i64),

    #[error("Item already has an awarded bid ({0})")]
    AwardExists(i64),

    #[error("Bid {0} cannot be awarded")]
    NotAwardable(i64),

    #[error("No bid has been awarded")]
    NoAwardedBid,

    #[error("A payment has already been requested for this item")]
    PaymentAlreadyRequested,

    #[error("No payment has been requested for this item")]
    PaymentMissing,

    #[error("Payment has not been marked received")]
    PaymentNotReceived,

    #[error("Attach at least one file to request a CAD revision")]
    NoRevisionFiles,

    #[error("CAD action '{action}' is not allowed while CAD is {status}")]
    CadTransition { action: &'static str, status: String },

    #[error("CAD version {0} is already approved")]
    CadAlreadyApproved(i64),

    #[error("Prototype action '{action}' is not allowed while prototype is {status}")]
    PrototypeTransition { action: &'static str, status: String },

    #[error("Prototype version {requested} is stale, current version is {current}")]
    StalePrototypeVersion { requested: i64, current: i64 },

    #[error("Feedback missing for keyword {0}")]
    FeedbackMissingKeyword(i64),

    #[error("Feedback given for untracked keyword {0}")]
    FeedbackUnknownKeyword(i64),

    #[error("Keyword {0} is marked satisfied but has phrases selected")]
    SatisfiedWithPhrases(i64),

    #[error("Keyword {keyword_id} has {count} phrases selected, at most {max} allowed")]
    TooManyPhrasesForKeyword { keyword_id: i64, count: usize, max: usize },

    #[error("{count} phrases selected in total, at most {max} allowed")]
    TooManyPhrases { count: usize, max: usize },

    #[error("Revision detail for keyword {keyword_id} is {len} characters, at most {max} allowed")]
    RevisionDetailTooLong { keyword_id: i64, len: usize, max: usize },
}
