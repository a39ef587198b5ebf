//! CADFLOW Core: stage chain, cross-validation and data model
//!
//! A pipeline is an ordered list of [`StageSpec`] records. The
//! [`StageSequencer`] runs them one after the other, binding each stage's
//! variables from earlier outputs and the original input, and the
//! [`CrossValidator`] asks an external verifier to check the combined result.
//!
//! ```text
//! PipelineInput → stage 1 → stage 2 → … → stage N → CrossValidator → ResultRecord
//!                    ↓          ↓                ↓           ↓
//!                 output     output           output    confirmation
//! ```

pub mod analysis;
pub mod capability;
pub mod confirm;
pub mod context;
pub mod data_model;
pub mod error;
pub mod runner;
pub mod stage;

pub use analysis::CadAnalyzer;
pub use capability::{
    Bindings, GenerationError, Generator, VerificationError, VerificationPayload, Verifier,
};
pub use confirm::CrossValidator;
pub use context::ExecutionContext;
pub use data_model::{
    Confirmation, InputValue, PipelineInput, ResultRecord, StageOutput, StageTrace,
    VerificationVerdict, CONFIRMATION_KEY, DATA_FIELD, DRAWING_FIELD,
};
pub use error::CadflowError;
pub use runner::StageSequencer;
pub use stage::{Pipeline, StageSpec};

/// Engine version
pub const CADFLOW_VERSION: &str = env!("CARGO_PKG_VERSION");
