use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine-readable failure kinds, carried both in error view-models and in
/// JSON error bodies.
#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[error("Choice must be one of for, against or abstain")]
    InvalidChoice,
    #[error("A voter identity is required on this screen")]
    MissingVoterIdentity,
    #[error("Voter identity is not valid")]
    InvalidVoterIdentity,
    #[error("The ballot store is unavailable")]
    StoreUnavailable,
    #[error("Identity lookup failed")]
    IdentityLookupFailed,
    #[error("Action is not available on this screen")]
    InvalidTransition,
    #[error("Resource not found")]
    NotFound,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Internal system error")]
    SystemError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self { error: error.into(), code }
    }
}
