use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid clearance number: {0}")]
    InvalidClearanceNumber(String),

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("comparison already holds the maximum of {0} predicates")]
    ComparisonFull(usize),

    #[error("no device record with id {0}")]
    RecordNotFound(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
