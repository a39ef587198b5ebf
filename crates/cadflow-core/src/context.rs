//! Execution Context: per-run identity carried through the pipeline
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub trace_id: String,
    pub pipeline: String,
    pub started_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            pipeline: pipeline.into(),
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since the run started
    pub fn elapsed_ms(&self) -> u64 {
        (Utc::now() - self.started_at).num_milliseconds().max(0) as u64
    }
}
