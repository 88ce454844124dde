// Error types for the service layer.
//
// `RequestError` covers validation of query parameters and is always the
// caller's fault (400). `ServiceError` wraps it together with failures from
// the composition library and knows which HTTP status each maps to.

use thiserror::Error;
use toy_piano_compose::error::{OracleError, RenderError};

/// A malformed or missing request parameter. Raised before any oracle call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("missing required parameter {0:?}")]
    Missing(&'static str),
    #[error("parameter {param:?} must be an integer, got {value:?}")]
    NotAnInteger { param: &'static str, value: String },
    #[error("species must be between 0 and 3, got {0}")]
    SpeciesOutOfRange(i64),
    #[error("parameter {param:?} needs {expected} comma-separated angles, got {actual}")]
    DegreeCount {
        param: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("parameter {param:?} contains a non-numeric angle {value:?}")]
    InvalidDegree { param: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The supply could not be populated; the walk did not run.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to listen on {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

impl ServiceError {
    /// HTTP status reported to the client.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Request(_) => 400,
            ServiceError::Oracle(_) => 503,
            ServiceError::Render(_) | ServiceError::Serialize(_) | ServiceError::Bind { .. } => 500,
        }
    }
}
