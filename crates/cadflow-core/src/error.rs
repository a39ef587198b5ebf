//! Unified Error Model
use thiserror::Error;

use crate::capability::{GenerationError, VerificationError};

#[derive(Error, Debug)]
pub enum CadflowError {
    /// A required input field is missing or empty.
    #[error("VALIDATION/{0}")]
    Validation(String),

    /// A stage declared a dependency that neither an earlier stage nor the
    /// input provides.
    #[error("CONFIG/stage '{stage}' requires '{variable}' which no earlier stage or input provides")]
    UnresolvedVariable { stage: String, variable: String },

    /// The pipeline definition itself is malformed.
    #[error("PIPELINE/{0}")]
    Pipeline(String),

    #[error("GENERATION/stage '{stage}': {source}")]
    Generation {
        stage: String,
        #[source]
        source: GenerationError,
    },

    #[error("VERIFICATION/{0}")]
    Verification(#[from] VerificationError),
}

impl CadflowError {
    /// Output key of the stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::UnresolvedVariable { stage, .. } | Self::Generation { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Whether the error was caused by the caller's input rather than the
    /// service or its configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
