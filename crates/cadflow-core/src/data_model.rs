//! Data Model: PipelineInput, StageOutput, ResultRecord
use base64::Engine;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Input field holding the tolerance/dimensional data document.
pub const DATA_FIELD: &str = "data";

/// Input field holding the optional source drawing.
pub const DRAWING_FIELD: &str = "drawing";

/// Result key reserved for the verification verdict.
pub const CONFIRMATION_KEY: &str = "confirmation";

/// A single input value. Drawings usually arrive as bytes, everything else
/// as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl InputValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Text form handed to the generator. Bytes are base64-encoded.
    pub fn to_binding(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Bytes(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.as_bytes().to_vec(),
            Self::Bytes(bytes) => bytes.clone(),
        }
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for InputValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Variable name → value, as handed over by the caller. Read-only for the
/// duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineInput {
    values: BTreeMap<String, InputValue>,
}

impl PipelineInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input with only the tolerance data document set
    pub fn from_data(data: impl Into<String>) -> Self {
        Self::new().with(DATA_FIELD, data.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<InputValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The tolerance data document, when present as text
    pub fn data(&self) -> Option<&str> {
        self.get(DATA_FIELD).and_then(InputValue::as_text)
    }

    /// The drawing payload, when present and non-empty
    pub fn drawing(&self) -> Option<&InputValue> {
        self.get(DRAWING_FIELD).filter(|value| !value.is_empty())
    }
}

/// Generated text per stage output key, in the order the stages ran.
///
/// Keys are write-once: a stage runs exactly once per pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    entries: Vec<(String, String)>,
}

impl StageOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` under `key`. Returns `false` and leaves the existing
    /// entry untouched when the key was already written.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, text.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for StageOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, text) in &self.entries {
            map.serialize_entry(key, text)?;
        }
        map.end()
    }
}

/// Execution record of one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTrace {
    pub output_key: String,
    pub template_id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub latency_ms: u64,
}

/// Verdict returned by the verification service.
///
/// Only `status` is named; everything else the service returns is passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl VerificationVerdict {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Outcome of the cross-validation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Confirmation {
    Verified(VerificationVerdict),
    /// The verification call failed; stage outputs are still valid.
    Unavailable { status: String, error: String },
}

impl Confirmation {
    pub const UNAVAILABLE: &'static str = "unavailable";

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self::Unavailable {
            status: Self::UNAVAILABLE.to_string(),
            error: error.into(),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    pub fn verdict(&self) -> Option<&VerificationVerdict> {
        match self {
            Self::Verified(verdict) => Some(verdict),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Terminal artifact of one analysis: every stage output plus the
/// confirmation. Serializes as a single flat object.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub trace_id: String,
    pub outputs: StageOutput,
    pub confirmation: Confirmation,
    pub traces: Vec<StageTrace>,
}

impl ResultRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.outputs.get(key)
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.outputs.len() + 1))?;
        for (key, text) in self.outputs.iter() {
            map.serialize_entry(key, text)?;
        }
        map.serialize_entry(CONFIRMATION_KEY, &self.confirmation)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_output_is_write_once() {
        let mut output = StageOutput::new();
        assert!(output.insert("structure", "first"));
        assert!(!output.insert("structure", "second"));
        assert_eq!(output.get("structure"), Some("first"));
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_drawing_placeholder_is_not_present() {
        let input = PipelineInput::from_data("A: 10±0.1").with(DRAWING_FIELD, Vec::new());
        assert!(input.drawing().is_none());
        assert_eq!(input.data(), Some("A: 10±0.1"));
    }

    #[test]
    fn test_bytes_bind_as_base64() {
        let value = InputValue::Bytes(b"%PDF".to_vec());
        assert_eq!(value.to_binding(), "JVBERg==");
    }

    #[test]
    fn test_result_record_is_flat() {
        let mut outputs = StageOutput::new();
        outputs.insert("structure", "s");
        outputs.insert("process", "p");
        let record = ResultRecord {
            trace_id: "t".to_string(),
            outputs,
            confirmation: Confirmation::Verified(VerificationVerdict::new("ok")),
            traces: Vec::new(),
        };

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "structure": "s", "process": "p", "confirmation": { "status": "ok" } })
        );
    }

    #[test]
    fn test_unavailable_confirmation_shape() {
        let value = serde_json::to_value(Confirmation::unavailable("timeout")).unwrap();
        assert_eq!(value, json!({ "status": "unavailable", "error": "timeout" }));
    }

    #[test]
    fn test_verdict_passes_through_details() {
        let verdict: VerificationVerdict =
            serde_json::from_value(json!({ "status": "success", "confidence": 0.93 })).unwrap();
        assert_eq!(verdict.status, "success");
        assert_eq!(verdict.details.get("confidence"), Some(&json!(0.93)));
    }
}
