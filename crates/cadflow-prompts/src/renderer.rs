//! Template rendering for prompts.
//!
//! Uses Handlebars with HTML escaping disabled and strict mode on, so a
//! template that references a variable the stage does not bind fails
//! instead of silently rendering an empty string. Custom helpers:
//! - truncate: Truncate string to max characters
//! - default: Fallback text for empty or missing values

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
};
use serde::Serialize;

use crate::templates::PromptFile;
use crate::PromptError;

/// Compiled renderer with registered helpers
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
    prompts: PromptFile,
}

impl PromptRenderer {
    pub fn new(prompts: PromptFile) -> Result<Self, PromptError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("truncate", Box::new(TruncateHelper));
        handlebars.register_helper("default", Box::new(DefaultHelper));

        for (name, template) in &prompts.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| PromptError::Template {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
        }

        Ok(PromptRenderer { handlebars, prompts })
    }

    pub fn load(path: &str) -> Result<Self, PromptError> {
        Self::new(PromptFile::load(path)?)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String, PromptError> {
        if !self.has_template(template_name) {
            return Err(PromptError::UnknownTemplate(template_name.to_string()));
        }
        self.handlebars
            .render(template_name, data)
            .map_err(|e| PromptError::Render {
                name: template_name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn system_message(&self) -> Option<&str> {
        self.prompts.system.as_deref()
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.prompts.list_templates()
    }
}

// ============================================================================
// Custom Helpers
// ============================================================================

/// Truncate a string to max characters with ellipsis
struct TruncateHelper;

impl HelperDef for TruncateHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let text = h.param(0)
            .and_then(|v| v.value().as_str())
            .unwrap_or("");

        let max_chars = h.param(1)
            .and_then(|v| v.value().as_u64())
            .unwrap_or(100) as usize;

        if text.chars().count() > max_chars {
            let head: String = text.chars().take(max_chars).collect();
            out.write(&head)?;
            out.write("...")?;
        } else {
            out.write(text)?;
        }
        Ok(())
    }
}

/// Default value helper
struct DefaultHelper;

impl HelperDef for DefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = h.param(0).map(|v| v.value());
        let default = h.param(1)
            .and_then(|v| v.value().as_str())
            .unwrap_or("");

        match value {
            Some(v) if v.as_str().map_or(!v.is_null(), |s| !s.trim().is_empty()) => {
                if let Some(s) = v.as_str() {
                    out.write(s)?;
                } else {
                    out.write(&v.to_string())?;
                }
            }
            _ => out.write(default)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_prompts() -> PromptFile {
        PromptFile::from_yaml(r#"
version: "1.0"
templates:
  review:
    template: "Review: {{data}}"
  short:
    template: "{{truncate text 5}}"
  fallback:
    template: "Drawing: {{default drawing \"none supplied\"}}"
"#).unwrap()
    }

    #[test]
    fn test_simple_render_keeps_symbols() {
        let renderer = PromptRenderer::new(test_prompts()).unwrap();
        let result = renderer.render("review", &json!({ "data": "Ø20 H7 <Ra 0.8> & ±0.1" })).unwrap();
        assert_eq!(result, "Review: Ø20 H7 <Ra 0.8> & ±0.1");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let renderer = PromptRenderer::new(test_prompts()).unwrap();
        let result = renderer.render("short", &json!({ "text": "零件尺寸与类别" })).unwrap();
        assert_eq!(result, "零件尺寸与...");
    }

    #[test]
    fn test_default_helper_on_empty_binding() {
        let renderer = PromptRenderer::new(test_prompts()).unwrap();
        let result = renderer.render("fallback", &json!({ "drawing": "" })).unwrap();
        assert_eq!(result, "Drawing: none supplied");
    }

    #[test]
    fn test_strict_mode_rejects_missing_variable() {
        let renderer = PromptRenderer::new(test_prompts()).unwrap();
        let err = renderer.render("review", &json!({})).unwrap_err();
        assert!(matches!(err, PromptError::Render { .. }));
    }

    #[test]
    fn test_unknown_template() {
        let renderer = PromptRenderer::new(test_prompts()).unwrap();
        let err = renderer.render("missing", &json!({})).unwrap_err();
        assert!(matches!(err, PromptError::UnknownTemplate(ref name) if name == "missing"));
    }

    #[test]
    fn test_invalid_template_rejected_on_load() {
        let prompts = PromptFile::from_yaml("version: \"1.0\"\ntemplates:\n  broken:\n    template: \"{{#if x}}\"\n").unwrap();
        assert!(matches!(PromptRenderer::new(prompts), Err(PromptError::Template { .. })));
    }
}
