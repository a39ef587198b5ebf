//! Cross-Validator: checks the aggregated analysis against the original input
use std::sync::Arc;
use tracing::{info, warn};

use crate::capability::{VerificationPayload, Verifier};
use crate::data_model::{Confirmation, PipelineInput, StageOutput, VerificationVerdict};
use crate::error::CadflowError;
use crate::stage::Pipeline;

const SECTION_SEPARATOR: &str = "\n\n";

pub struct CrossValidator {
    verifier: Arc<dyn Verifier>,
}

impl CrossValidator {
    pub fn new(verifier: Arc<dyn Verifier>) -> Self {
        Self { verifier }
    }

    /// Join stage outputs in pipeline declaration order, regardless of the
    /// order they were stored in.
    pub fn combined_text(pipeline: &Pipeline, output: &StageOutput) -> String {
        pipeline
            .output_keys()
            .filter_map(|key| output.get(key))
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR)
    }

    pub fn payload(combined_text: &str, input: &PipelineInput) -> VerificationPayload {
        VerificationPayload {
            combined_text: combined_text.to_string(),
            original_data: input.data().unwrap_or_default().to_string(),
            drawing: input.drawing().map(|value| value.to_bytes()),
        }
    }

    pub async fn confirm(
        &self,
        combined_text: &str,
        input: &PipelineInput,
    ) -> Result<VerificationVerdict, CadflowError> {
        let payload = Self::payload(combined_text, input);
        let verdict = self.verifier.verify(&payload).await?;
        Ok(verdict)
    }

    /// Confirm a finished stage run. A failed verification call yields an
    /// unavailable confirmation instead of an error.
    pub async fn confirm_output(
        &self,
        pipeline: &Pipeline,
        output: &StageOutput,
        input: &PipelineInput,
        trace_id: &str,
    ) -> Confirmation {
        let combined = Self::combined_text(pipeline, output);
        match self.confirm(&combined, input).await {
            Ok(verdict) => {
                info!(trace_id, status = %verdict.status, "Confirmation received");
                Confirmation::Verified(verdict)
            }
            Err(e) => {
                warn!(trace_id, error = %e, "Confirmation unavailable, returning stage outputs only");
                Confirmation::unavailable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::DRAWING_FIELD;
    use crate::stage::StageSpec;

    #[test]
    fn test_combined_text_follows_declaration_order() {
        let pipeline = Pipeline::new(
            "demo",
            vec![
                StageSpec::new("structure", "s", ["data"]),
                StageSpec::new("process", "p", ["structure"]),
            ],
        )
        .unwrap();

        let mut output = StageOutput::new();
        output.insert("process", "route");
        output.insert("structure", "review");

        assert_eq!(
            CrossValidator::combined_text(&pipeline, &output),
            "review\n\nroute"
        );
    }

    #[test]
    fn test_payload_omits_empty_drawing() {
        let input = PipelineInput::from_data("A: 10").with(DRAWING_FIELD, "");
        let payload = CrossValidator::payload("text", &input);
        assert_eq!(payload.original_data, "A: 10");
        assert!(payload.drawing.is_none());
    }

    #[test]
    fn test_payload_carries_drawing_bytes() {
        let input = PipelineInput::from_data("A: 10").with(DRAWING_FIELD, b"%PDF-1.7".to_vec());
        let payload = CrossValidator::payload("text", &input);
        assert_eq!(payload.drawing.as_deref(), Some(&b"%PDF-1.7"[..]));
    }
}
