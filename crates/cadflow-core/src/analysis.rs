//! Analyzer: sequencer followed by cross-validation, producing the ResultRecord
use std::sync::Arc;
use tracing::info;

use crate::capability::{Generator, Verifier};
use crate::confirm::CrossValidator;
use crate::context::ExecutionContext;
use crate::data_model::{PipelineInput, ResultRecord};
use crate::error::CadflowError;
use crate::runner::StageSequencer;
use crate::stage::Pipeline;

pub struct CadAnalyzer {
    sequencer: StageSequencer,
    validator: CrossValidator,
}

impl CadAnalyzer {
    pub fn new(pipeline: Pipeline, generator: Arc<dyn Generator>, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            sequencer: StageSequencer::new(pipeline, generator),
            validator: CrossValidator::new(verifier),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        self.sequencer.pipeline()
    }

    pub async fn analyze(&self, input: &PipelineInput) -> Result<ResultRecord, CadflowError> {
        let ctx = ExecutionContext::new(self.pipeline().name());
        self.analyze_with(input, &ctx).await
    }

    /// Stage failures abort the analysis; a failed confirmation does not.
    pub async fn analyze_with(
        &self,
        input: &PipelineInput,
        ctx: &ExecutionContext,
    ) -> Result<ResultRecord, CadflowError> {
        info!(
            trace_id = %ctx.trace_id,
            pipeline = %self.sequencer.pipeline().pipeline_id(),
            "Starting analysis"
        );

        let (outputs, traces) = self.sequencer.run_traced(input, ctx).await?;
        let confirmation = self
            .validator
            .confirm_output(self.pipeline(), &outputs, input, &ctx.trace_id)
            .await;

        info!(
            trace_id = %ctx.trace_id,
            elapsed_ms = ctx.elapsed_ms(),
            confirmed = confirmation.is_verified(),
            "Analysis finished"
        );

        Ok(ResultRecord {
            trace_id: ctx.trace_id.clone(),
            outputs,
            confirmation,
            traces,
        })
    }
}
