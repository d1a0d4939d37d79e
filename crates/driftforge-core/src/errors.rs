//! Engine-wide error taxonomy.
//!
//! Four failure classes cover every operation: a reference that resolves
//! to nothing, a reference that can never be satisfied, input the engine
//! refuses to interpret, and backend trouble. Everything else rides in
//! through [`EngineError::Other`].

use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A source or schema version that does not exist (yet).
    #[error("not found: {details}")]
    NotFound { details: Cow<'static, str> },

    /// A reference that is structurally valid but cannot be satisfied,
    /// e.g. storing a document against an unregistered schema version.
    #[error("invalid reference: {details}")]
    InvalidReference { details: Cow<'static, str> },

    /// Input the engine refuses to interpret, e.g. an unparsable schema
    /// identifier or an empty source name.
    #[error("malformed input: {details}")]
    MalformedInput { details: Cow<'static, str> },

    /// The persistence backend failed.
    #[error("storage error: {details}")]
    Storage { details: Cow<'static, str> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Stable machine-readable class of this error.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::InvalidReference { .. } => "invalid_reference",
            EngineError::MalformedInput { .. } => "malformed_input",
            EngineError::Storage { .. } => "storage",
            EngineError::Other(_) => "internal",
        }
    }

    /// Human-readable detail text.
    pub fn details(&self) -> String {
        match self {
            EngineError::NotFound { details }
            | EngineError::InvalidReference { details }
            | EngineError::MalformedInput { details }
            | EngineError::Storage { details } => details.to_string(),
            EngineError::Other(err) => err.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
