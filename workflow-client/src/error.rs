use shared::RuleViolation;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Caught before any request left the client.
    #[error(transparent)]
    Validation(#[from] RuleViolation),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The backend's message, verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Award of bid {0} was only partially applied; refresh and retry")]
    InconsistentAward(i64),

    #[error("No item is open")]
    NoItemOpen,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
