use crate::error::{PromptError, Result};
use tera::Tera;

/// Tera-backed template engine for system prompts and quick actions.
#[derive(Clone)]
pub struct PromptEngine {
    tera: Tera,
}

impl PromptEngine {
    /// Create with inline templates (no filesystem).
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// Register a template from a string.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<()> {
        self.tera
            .add_raw_template(name, content)
            .map_err(|e| PromptError::Render(e.to_string()))?;
        Ok(())
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String> {
        let rendered = self.tera.render(name, context).map_err(|e| match e.kind {
            tera::ErrorKind::TemplateNotFound(name) => PromptError::NotFound(name),
            _ => PromptError::Render(e.to_string()),
        })?;
        Ok(rendered)
    }

    /// Render a one-off string template (not registered).
    pub fn render_str(&self, template: &str, context: &tera::Context) -> Result<String> {
        let rendered = Tera::one_off(template, context, false)
            .map_err(|e| PromptError::Render(e.to_string()))?;
        Ok(rendered)
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReachError;
    use tera::Context;

    #[test]
    fn add_template_and_render() {
        let mut engine = PromptEngine::new();
        engine.add_template("greeting", "Hello, {{ name }}!").unwrap();

        let mut ctx = Context::new();
        ctx.insert("name", "World");
        assert_eq!(engine.render("greeting", &ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn missing_template_maps_to_not_found() {
        let engine = PromptEngine::new();
        let err = engine.render("nonexistent", &Context::new()).unwrap_err();
        assert!(matches!(
            err,
            ReachError::Prompt(PromptError::NotFound(ref name)) if name == "nonexistent"
        ));
    }

    #[test]
    fn missing_variable_is_a_render_error() {
        let mut engine = PromptEngine::new();
        engine.add_template("greeting", "Hello, {{ name }}!").unwrap();
        let err = engine.render("greeting", &Context::new()).unwrap_err();
        assert!(matches!(err, ReachError::Prompt(PromptError::Render(_))));
    }

    #[test]
    fn render_str_one_off() {
        let engine = PromptEngine::new();
        let mut ctx = Context::new();
        ctx.insert("item", "a condo");
        let result = engine.render_str("Listed: {{ item }}.", &ctx).unwrap();
        assert_eq!(result, "Listed: a condo.");
    }

    #[test]
    fn add_template_replaces_existing() {
        let mut engine = PromptEngine::new();
        engine.add_template("t", "version 1").unwrap();
        engine.add_template("t", "version 2").unwrap();
        assert_eq!(engine.render("t", &Context::new()).unwrap(), "version 2");
    }
}
