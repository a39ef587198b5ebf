//! CADFLOW Stages: the pipelines shipped with the service.
//!
//! Pipelines are plain YAML data compiled into the binary. A deployment can
//! point `CADFLOW_PIPELINE` at its own definition file instead.
//!
//! # Pipeline Flow
//!
//! ```text
//! cad-analysis:    data, drawing → structure → process → cost
//!                                                     ↘ nc_code
//! drawing-review:  data, drawing → extraction → review → analysis
//! ```

pub mod definition;

pub use definition::{pipeline_from_yaml, DefinitionError, PipelineDefinition, StageDefinition};

use cadflow_core::Pipeline;
use std::path::Path;

pub const CAD_ANALYSIS: &str = "cad-analysis";
pub const DRAWING_REVIEW: &str = "drawing-review";

const CAD_ANALYSIS_YAML: &str = include_str!("../pipelines/cad-analysis.yaml");
const DRAWING_REVIEW_YAML: &str = include_str!("../pipelines/drawing-review.yaml");

/// Structural review → process route → cost estimate → NC code
pub fn cad_analysis_pipeline() -> Result<Pipeline, DefinitionError> {
    pipeline_from_yaml(CAD_ANALYSIS_YAML)
}

/// Extract dimensions → plausibility review → self-check
pub fn drawing_review_pipeline() -> Result<Pipeline, DefinitionError> {
    pipeline_from_yaml(DRAWING_REVIEW_YAML)
}

pub fn builtin_names() -> &'static [&'static str] {
    &[CAD_ANALYSIS, DRAWING_REVIEW]
}

pub fn builtin(name: &str) -> Result<Pipeline, DefinitionError> {
    match name {
        CAD_ANALYSIS => cad_analysis_pipeline(),
        DRAWING_REVIEW => drawing_review_pipeline(),
        other => Err(DefinitionError::UnknownPipeline(other.to_string())),
    }
}

/// Resolve a pipeline by built-in name, or else treat `spec` as a path to
/// a YAML definition.
pub fn resolve(spec: &str) -> Result<Pipeline, DefinitionError> {
    if builtin_names().contains(&spec) {
        return builtin(spec);
    }
    if Path::new(spec).is_file() {
        return PipelineDefinition::load(spec)?.into_pipeline();
    }
    Err(DefinitionError::UnknownPipeline(spec.to_string()))
}
