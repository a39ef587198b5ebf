//! Prompt template files.
//!
//! A prompt file is YAML with an optional shared system message and a map
//! of named Handlebars templates:
//!
//! ```yaml
//! version: "1.0"
//! system: "You are a senior manufacturing engineer."
//! templates:
//!   process_route.v1:
//!     description: Machining process route
//!     template: "Given this review: {{structure}} ..."
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::PromptError;

/// Top-level prompt file structure
#[derive(Debug, Clone, Deserialize)]
pub struct PromptFile {
    pub version: String,
    /// System message sent ahead of every rendered prompt
    #[serde(default)]
    pub system: Option<String>,
    pub templates: BTreeMap<String, PromptTemplate>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl PromptFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PromptError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PromptError> {
        let file: PromptFile =
            serde_yaml::from_str(yaml).map_err(|e| PromptError::Load(e.to_string()))?;
        if file.templates.is_empty() {
            return Err(PromptError::Load("prompt file defines no templates".to_string()));
        }
        Ok(file)
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt_file() {
        let yaml = r#"
version: "1.0"
system: "Be precise."
templates:
  structure_review.v1:
    description: Structural review
    template: "Review {{data}}"
"#;

        let file = PromptFile::from_yaml(yaml).unwrap();
        assert_eq!(file.system.as_deref(), Some("Be precise."));
        assert_eq!(file.list_templates(), vec!["structure_review.v1"]);
        assert_eq!(file.get("structure_review.v1").unwrap().template, "Review {{data}}");
    }

    #[test]
    fn test_empty_template_map_rejected() {
        let yaml = "version: \"1.0\"\ntemplates: {}\n";
        assert!(PromptFile::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = PromptFile::load("/nonexistent/prompts.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/prompts.yaml"));
    }
}
