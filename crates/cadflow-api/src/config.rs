//! Service configuration, read once from the environment at startup.
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 32;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_VLM_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CONFIG/{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address (`CADFLOW_ADDR`)
    pub addr: String,
    /// Built-in pipeline name or YAML path (`CADFLOW_PIPELINE`)
    pub pipeline: String,
    /// Prompt file overriding the shipped one (`CADFLOW_PROMPTS`)
    pub prompts_path: Option<String>,
    /// Verification endpoint (`CADFLOW_VLM_URL`); unset means the echo verifier
    pub vlm_url: Option<String>,
    pub vlm_timeout: Duration,
    pub max_upload_bytes: usize,
    pub temperature: f32,
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            pipeline: cadflow_stages::CAD_ANALYSIS.to_string(),
            prompts_path: None,
            vlm_url: None,
            vlm_timeout: Duration::from_secs(DEFAULT_VLM_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            temperature: DEFAULT_TEMPERATURE,
            log_json: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let max_upload_bytes = match get("CADFLOW_MAX_UPLOAD_MB") {
            Some(raw) => parse::<usize>("CADFLOW_MAX_UPLOAD_MB", &raw)? * 1024 * 1024,
            None => defaults.max_upload_bytes,
        };
        let temperature = match get("CADFLOW_TEMPERATURE") {
            Some(raw) => parse::<f32>("CADFLOW_TEMPERATURE", &raw)?,
            None => defaults.temperature,
        };
        let vlm_timeout = match get("CADFLOW_VLM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse("CADFLOW_VLM_TIMEOUT_SECS", &raw)?),
            None => defaults.vlm_timeout,
        };
        let log_json = matches!(
            get("CADFLOW_LOG_JSON").as_deref(),
            Some("1") | Some("true") | Some("yes")
        );

        Ok(Self {
            addr: get("CADFLOW_ADDR").unwrap_or(defaults.addr),
            pipeline: get("CADFLOW_PIPELINE").unwrap_or(defaults.pipeline),
            prompts_path: get("CADFLOW_PROMPTS"),
            vlm_url: get("CADFLOW_VLM_URL"),
            vlm_timeout,
            max_upload_bytes,
            temperature,
            log_json,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.pipeline, "cad-analysis");
        assert_eq!(config.max_upload_bytes, 32 * 1024 * 1024);
        assert_eq!(config.temperature, 0.2);
        assert!(config.vlm_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("CADFLOW_ADDR", "127.0.0.1:9000"),
            ("CADFLOW_PIPELINE", "drawing-review"),
            ("CADFLOW_VLM_URL", "http://vlm:8080/confirm"),
            ("CADFLOW_MAX_UPLOAD_MB", "4"),
            ("CADFLOW_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(config.pipeline, "drawing-review");
        assert_eq!(config.vlm_url.as_deref(), Some("http://vlm:8080/confirm"));
        assert_eq!(config.max_upload_bytes, 4 * 1024 * 1024);
        assert!(config.log_json);
    }

    #[test]
    fn test_blank_value_is_unset() {
        let config = ApiConfig::from_lookup(lookup(&[("CADFLOW_VLM_URL", "  ")])).unwrap();
        assert!(config.vlm_url.is_none());
    }

    #[test]
    fn test_invalid_number() {
        let err = ApiConfig::from_lookup(lookup(&[("CADFLOW_TEMPERATURE", "warm")])).unwrap_err();
        assert!(err.to_string().contains("CADFLOW_TEMPERATURE"));
    }
}
