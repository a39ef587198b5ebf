//! Prometheus counters for analyses, stage failures and confirmations.
use cadflow_core::{CadflowError, ResultRecord};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    analyses: IntCounterVec,
    stage_failures: IntCounterVec,
    confirmation_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let analyses = IntCounterVec::new(
            Opts::new("cadflow_analyses_total", "Analyses handled, by outcome"),
            &["outcome"],
        )?;
        let stage_failures = IntCounterVec::new(
            Opts::new("cadflow_stage_failures_total", "Generation failures, by stage"),
            &["stage"],
        )?;
        let confirmation_failures = IntCounter::new(
            "cadflow_confirmation_failures_total",
            "Analyses returned without a confirmation",
        )?;

        registry.register(Box::new(analyses.clone()))?;
        registry.register(Box::new(stage_failures.clone()))?;
        registry.register(Box::new(confirmation_failures.clone()))?;

        Ok(Self {
            registry,
            analyses,
            stage_failures,
            confirmation_failures,
        })
    }

    pub fn record(&self, result: &Result<ResultRecord, CadflowError>) {
        let outcome = match result {
            Ok(record) if record.confirmation.is_verified() => "confirmed",
            Ok(_) => {
                self.confirmation_failures.inc();
                "unconfirmed"
            }
            Err(CadflowError::Validation(_)) => "rejected",
            Err(err) => {
                if let Some(stage) = err.stage() {
                    self.stage_failures.with_label_values(&[stage]).inc();
                }
                "failed"
            }
        };
        self.analyses.with_label_values(&[outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadflow_core::GenerationError;

    #[test]
    fn test_failures_are_counted_per_stage() {
        let metrics = Metrics::new().unwrap();
        metrics.record(&Err(CadflowError::Generation {
            stage: "cost".to_string(),
            source: GenerationError::new("boom"),
        }));
        metrics.record(&Err(CadflowError::Validation("empty".to_string())));

        let text = metrics.encode().unwrap();
        assert!(text.contains("cadflow_stage_failures_total{stage=\"cost\"} 1"));
        assert!(text.contains("cadflow_analyses_total{outcome=\"failed\"} 1"));
        assert!(text.contains("cadflow_analyses_total{outcome=\"rejected\"} 1"));
    }
}
