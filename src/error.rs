use thiserror::Error;

/// Failures raised while translating boundary declarations.
///
/// All of them are static configuration errors: they are raised eagerly during
/// assembly and never recovered from internally.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("malformed boundary condition: {0}")]
    MalformedCondition(String),
    #[error("unknown boundary condition type: {0}")]
    UnknownConditionType(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("no material found for subdomain {0}")]
    MaterialNotFound(usize),
    #[error("problem description is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoundaryError>;
