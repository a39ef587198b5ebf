//! YAML pipeline definitions.
//!
//! ```yaml
//! name: cad-analysis
//! required_inputs: [data]
//! optional_inputs: [drawing]
//! stages:
//!   - output_key: structure
//!     template: structure_review.v1
//!     inputs: [data, drawing]
//! ```
//!
//! Definitions are checked on load: output keys must be unique and every
//! stage input must come from a declared input or an earlier stage.

use cadflow_core::{CadflowError, Pipeline, StageSpec, DATA_FIELD, DRAWING_FIELD};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Failed to read pipeline definition {path}: {message}")]
    Io { path: String, message: String },
    #[error("Failed to parse pipeline definition: {0}")]
    Parse(String),
    #[error("Invalid pipeline definition: {0}")]
    Invalid(#[from] CadflowError),
    #[error("Unknown pipeline '{0}'")]
    UnknownPipeline(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default = "default_required")]
    pub required_inputs: Vec<String>,
    #[serde(default = "default_optional")]
    pub optional_inputs: Vec<String>,
    pub stages: Vec<StageDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageDefinition {
    pub output_key: String,
    pub template: String,
    #[serde(default)]
    pub inputs: Vec<String>,
}

fn default_required() -> Vec<String> {
    vec![DATA_FIELD.to_string()]
}

fn default_optional() -> Vec<String> {
    vec![DRAWING_FIELD.to_string()]
}

impl PipelineDefinition {
    pub fn from_yaml(yaml: &str) -> Result<Self, DefinitionError> {
        serde_yaml::from_str(yaml).map_err(|e| DefinitionError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DefinitionError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Build and statically check the pipeline.
    pub fn into_pipeline(self) -> Result<Pipeline, DefinitionError> {
        let stages = self
            .stages
            .into_iter()
            .map(|stage| StageSpec::new(stage.output_key, stage.template, stage.inputs))
            .collect();

        let pipeline = Pipeline::new(self.name, stages)?
            .with_required_inputs(self.required_inputs)
            .with_optional_inputs(self.optional_inputs);
        pipeline.check_dependencies()?;
        Ok(pipeline)
    }
}

/// Parse and check a YAML definition in one go.
pub fn pipeline_from_yaml(yaml: &str) -> Result<Pipeline, DefinitionError> {
    PipelineDefinition::from_yaml(yaml)?.into_pipeline()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_inputs() {
        let yaml = r#"
name: tiny
stages:
  - output_key: structure
    template: structure_review.v1
    inputs: [data]
"#;
        let pipeline = pipeline_from_yaml(yaml).unwrap();
        assert_eq!(pipeline.required_inputs(), ["data".to_string()]);
        assert!(pipeline.is_optional("drawing"));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let yaml = r#"
name: backwards
stages:
  - output_key: process
    template: process_route.v1
    inputs: [structure]
  - output_key: structure
    template: structure_review.v1
    inputs: [data]
"#;
        let err = pipeline_from_yaml(yaml).unwrap_err();
        assert!(matches!(err, DefinitionError::Invalid(CadflowError::Pipeline(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            pipeline_from_yaml("name: [unterminated"),
            Err(DefinitionError::Parse(_))
        ));
    }
}
