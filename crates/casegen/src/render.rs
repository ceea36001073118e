//! Template rendering

use std::fmt;

use casegen_core::ParamSet;
use handlebars::Handlebars;

/// Template could not be rendered
#[derive(Debug, Clone)]
pub struct RenderError(pub String);

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template error: {}", self.0)
    }
}

impl std::error::Error for RenderError {}

/// Turns a template and one case's parameters into the case input text
pub trait Renderer {
    fn render(&self, template: &str, params: &ParamSet) -> Result<String, RenderError>;
}

/// Renders `{{ name }}` placeholders with Handlebars.
///
/// Output is not HTML-escaped. Unknown names render as empty text. Values
/// are written as JSON numbers, so `2` renders as `2.0`.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, template: &str, params: &ParamSet) -> Result<String, RenderError> {
        self.registry
            .render_template(template, params)
            .map_err(|e| RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> ParamSet {
        pairs.iter().map(|&(n, v)| (n, v)).collect()
    }

    #[test]
    fn test_render_substitutes_values() {
        let renderer = HandlebarsRenderer::new();
        let text = renderer
            .render(
                "*SECTION_SHELL\n{{ thickness }},{{load}}\n",
                &params(&[("thickness", 2.0), ("load", 0.25)]),
            )
            .unwrap();
        assert_eq!(text, "*SECTION_SHELL\n2.0,0.25\n");
    }

    #[test]
    fn test_render_does_not_escape() {
        let renderer = HandlebarsRenderer::new();
        let text = renderer
            .render("<{{ a }}> & \"{{ a }}\"", &params(&[("a", -1.5)]))
            .unwrap();
        assert_eq!(text, "<-1.5> & \"-1.5\"");
    }

    #[test]
    fn test_render_unknown_name_is_empty() {
        let renderer = HandlebarsRenderer::new();
        let text = renderer.render("[{{ missing }}]", &ParamSet::new()).unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn test_render_reports_syntax_errors() {
        let renderer = HandlebarsRenderer::new();
        let err = renderer.render("{{#if a}}", &params(&[("a", 1.0)])).unwrap_err();
        assert!(err.to_string().starts_with("template error:"));
    }
}
