//! Stage declarations: a pipeline is an ordered list of `StageSpec` records
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data_model::{CONFIRMATION_KEY, DATA_FIELD, DRAWING_FIELD};
use crate::error::CadflowError;

/// One generation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Key the generated text is stored under (ex: "process_route")
    pub output_key: String,
    /// Prompt template handed to the generator (ex: "process_route.v1")
    pub template_id: String,
    /// Variables bound into the template, resolved from earlier stage
    /// outputs first, then from the pipeline input
    pub inputs: Vec<String>,
}

impl StageSpec {
    pub fn new<I, S>(output_key: impl Into<String>, template_id: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output_key: output_key.into(),
            template_id: template_id.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// A named, validated chain of stages
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    name: String,
    stages: Vec<StageSpec>,
    required_inputs: Vec<String>,
    optional_inputs: Vec<String>,
}

impl Pipeline {
    /// Build a pipeline requiring `data` and accepting an optional
    /// `drawing`. Fails on an empty stage list, blank or duplicate output
    /// keys, and on use of the reserved `confirmation` key.
    pub fn new(name: impl Into<String>, stages: Vec<StageSpec>) -> Result<Self, CadflowError> {
        let name = name.into();
        if stages.is_empty() {
            return Err(CadflowError::Pipeline(format!("pipeline '{}' has no stages", name)));
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if stage.output_key.trim().is_empty() || stage.template_id.trim().is_empty() {
                return Err(CadflowError::Pipeline(format!(
                    "pipeline '{}' has a stage with a blank output key or template",
                    name
                )));
            }
            if stage.output_key == CONFIRMATION_KEY {
                return Err(CadflowError::Pipeline(format!(
                    "output key '{}' is reserved",
                    CONFIRMATION_KEY
                )));
            }
            if !seen.insert(stage.output_key.as_str()) {
                return Err(CadflowError::Pipeline(format!(
                    "output key '{}' is declared twice",
                    stage.output_key
                )));
            }
        }

        Ok(Self {
            name,
            stages,
            required_inputs: vec![DATA_FIELD.to_string()],
            optional_inputs: vec![DRAWING_FIELD.to_string()],
        })
    }

    pub fn with_required_inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_inputs = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_optional_inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_inputs = names.into_iter().map(Into::into).collect();
        self
    }

    /// Static dependency check against the declared input fields.
    ///
    /// `data` must be required, and every stage input must be a declared
    /// input or the output of a strictly earlier stage.
    pub fn check_dependencies(&self) -> Result<(), CadflowError> {
        if !self.required_inputs.iter().any(|name| name == DATA_FIELD) {
            return Err(CadflowError::Pipeline(format!(
                "'{}' must be a required input",
                DATA_FIELD
            )));
        }

        let mut available: HashSet<&str> = self
            .required_inputs
            .iter()
            .chain(&self.optional_inputs)
            .map(String::as_str)
            .collect();

        for (index, stage) in self.stages.iter().enumerate() {
            for variable in &stage.inputs {
                if available.contains(variable.as_str()) {
                    continue;
                }
                let produced_later = self.stages[index..]
                    .iter()
                    .any(|later| &later.output_key == variable);
                if produced_later {
                    return Err(CadflowError::Pipeline(format!(
                        "stage '{}' uses '{}' before it is produced",
                        stage.output_key, variable
                    )));
                }
                return Err(CadflowError::UnresolvedVariable {
                    stage: stage.output_key.clone(),
                    variable: variable.clone(),
                });
            }
            available.insert(stage.output_key.as_str());
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn required_inputs(&self) -> &[String] {
        &self.required_inputs
    }

    pub fn optional_inputs(&self) -> &[String] {
        &self.optional_inputs
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.optional_inputs.iter().any(|n| n == name)
    }

    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.output_key.as_str())
    }

    /// Compact identifier such as `structure→process→cost`
    pub fn pipeline_id(&self) -> String {
        self.output_keys().collect::<Vec<_>>().join("→")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<StageSpec> {
        vec![
            StageSpec::new("structure", "structure", ["data", "drawing"]),
            StageSpec::new("process", "process", ["structure"]),
        ]
    }

    #[test]
    fn test_pipeline_id() {
        let pipeline = Pipeline::new("demo", chain()).unwrap();
        assert_eq!(pipeline.pipeline_id(), "structure→process");
        assert!(pipeline.check_dependencies().is_ok());
    }

    #[test]
    fn test_duplicate_output_key_rejected() {
        let stages = vec![
            StageSpec::new("structure", "a", ["data"]),
            StageSpec::new("structure", "b", ["data"]),
        ];
        assert!(matches!(
            Pipeline::new("dup", stages),
            Err(CadflowError::Pipeline(_))
        ));
    }

    #[test]
    fn test_reserved_key_rejected() {
        let stages = vec![StageSpec::new("confirmation", "a", ["data"])];
        assert!(Pipeline::new("reserved", stages).is_err());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(Pipeline::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn test_forward_reference_detected() {
        let stages = vec![
            StageSpec::new("process", "process", ["structure"]),
            StageSpec::new("structure", "structure", ["data"]),
        ];
        let pipeline = Pipeline::new("backwards", stages).unwrap();
        let err = pipeline.check_dependencies().unwrap_err();
        assert!(err.to_string().contains("before it is produced"));
    }

    #[test]
    fn test_data_must_stay_required() {
        let pipeline = Pipeline::new("notes", vec![StageSpec::new("summary", "s", ["notes"])])
            .unwrap()
            .with_required_inputs(["notes"]);
        assert!(matches!(
            pipeline.check_dependencies(),
            Err(CadflowError::Pipeline(ref msg)) if msg.contains("'data'")
        ));
    }

    #[test]
    fn test_unknown_variable_detected() {
        let stages = vec![StageSpec::new("cost", "cost", ["material"])];
        let pipeline = Pipeline::new("unknown", stages).unwrap();
        assert!(matches!(
            pipeline.check_dependencies(),
            Err(CadflowError::UnresolvedVariable { ref variable, .. }) if variable == "material"
        ));
    }
}
