//! Stage Sequencer: runs the stage chain in order, feeding each stage the
//! outputs of the stages before it
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

use crate::capability::{Bindings, Generator};
use crate::context::ExecutionContext;
use crate::data_model::{InputValue, PipelineInput, StageOutput, StageTrace, DATA_FIELD};
use crate::error::CadflowError;
use crate::stage::{Pipeline, StageSpec};

pub struct StageSequencer {
    pipeline: Pipeline,
    generator: Arc<dyn Generator>,
}

impl StageSequencer {
    pub fn new(pipeline: Pipeline, generator: Arc<dyn Generator>) -> Self {
        Self {
            pipeline,
            generator,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run every stage and return their outputs.
    pub async fn run(&self, input: &PipelineInput) -> Result<StageOutput, CadflowError> {
        let ctx = ExecutionContext::new(self.pipeline.name());
        let (output, _) = self.run_traced(input, &ctx).await?;
        Ok(output)
    }

    /// Like [`run`](Self::run) but also returns one trace per stage.
    ///
    /// The input is validated before any generation call. A generation
    /// failure aborts the run; nothing produced so far is returned.
    pub async fn run_traced(
        &self,
        input: &PipelineInput,
        ctx: &ExecutionContext,
    ) -> Result<(StageOutput, Vec<StageTrace>), CadflowError> {
        self.validate(input)?;

        let mut output = StageOutput::new();
        let mut traces = Vec::with_capacity(self.pipeline.stages().len());

        for stage in self.pipeline.stages() {
            let bindings = self.bind(stage, &output, input)?;
            let in_hash = hash_bytes(&serde_json::to_vec(&bindings).unwrap_or_default());

            debug!(
                trace_id = %ctx.trace_id,
                stage = %stage.output_key,
                template = %stage.template_id,
                "Running stage"
            );
            let start = Instant::now();

            let span = info_span!(
                "stage",
                trace_id = %ctx.trace_id,
                stage = %stage.output_key,
                template = %stage.template_id
            );
            let text = self
                .generator
                .generate(&stage.template_id, &bindings)
                .instrument(span)
                .await
                .map_err(|source| {
                    error!(
                        trace_id = %ctx.trace_id,
                        stage = %stage.output_key,
                        error = %source,
                        "Stage generation failed"
                    );
                    CadflowError::Generation {
                        stage: stage.output_key.clone(),
                        source,
                    }
                })?;

            let latency_ms = start.elapsed().as_millis() as u64;
            info!(
                trace_id = %ctx.trace_id,
                stage = %stage.output_key,
                latency_ms,
                chars = text.len(),
                "Stage completed"
            );

            traces.push(StageTrace {
                output_key: stage.output_key.clone(),
                template_id: stage.template_id.clone(),
                in_hash,
                out_hash: hash_bytes(text.as_bytes()),
                latency_ms,
            });
            output.insert(stage.output_key.clone(), text);
        }

        Ok((output, traces))
    }

    /// Every required input field must be present and non-empty, and the
    /// tolerance data must be text.
    pub fn validate(&self, input: &PipelineInput) -> Result<(), CadflowError> {
        match input.get(DATA_FIELD) {
            Some(InputValue::Text(text)) if !text.trim().is_empty() => {}
            Some(InputValue::Bytes(bytes)) if !bytes.is_empty() => {
                return Err(CadflowError::Validation(format!(
                    "'{}' must be text, not binary",
                    DATA_FIELD
                )))
            }
            _ => {
                return Err(CadflowError::Validation(format!(
                    "'{}' is required and must not be empty",
                    DATA_FIELD
                )))
            }
        }
        for name in self.pipeline.required_inputs() {
            match input.get(name) {
                Some(value) if !value.is_empty() => {}
                _ => {
                    return Err(CadflowError::Validation(format!(
                        "'{}' is required and must not be empty",
                        name
                    )))
                }
            }
        }
        Ok(())
    }

    /// Resolve a stage's variables. Precedence: earlier stage output, then
    /// pipeline input, then an empty placeholder for optional inputs.
    fn bind(
        &self,
        stage: &StageSpec,
        output: &StageOutput,
        input: &PipelineInput,
    ) -> Result<Bindings, CadflowError> {
        let mut bindings = Bindings::new();
        for variable in &stage.inputs {
            let value = if let Some(text) = output.get(variable) {
                text.to_string()
            } else if let Some(value) = input.get(variable) {
                value.to_binding()
            } else if self.pipeline.is_optional(variable) {
                String::new()
            } else {
                return Err(CadflowError::UnresolvedVariable {
                    stage: stage.output_key.clone(),
                    variable: variable.clone(),
                });
            };
            bindings.insert(variable.clone(), value);
        }
        Ok(bindings)
    }
}

fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}
