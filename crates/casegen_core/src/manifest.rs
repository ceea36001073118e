//! Per-case manifest serialization.
//!
//! Every generated case carries a manifest recording the template it came
//! from, the concrete parameter values it was rendered with, and the full
//! variable definitions of the run. The format is line oriented:
//!
//! ```text
//! [meta]
//! template_file = "input.template"
//!
//! [template_params]
//! thickness = 1.5
//!
//! [variables]
//!
//! [variables.thickness]
//! enabled = true
//! mode = "range"
//! min_value = 1.0
//! max_value = 2.0
//! step = 0.5
//! ```
//!
//! Parameter keys and variable sections are sorted by name; keys within a
//! variable section keep their definition order. The output is valid TOML
//! and identical inputs always produce identical bytes.

use std::collections::BTreeMap;
use std::fmt;

use crate::batch::BatchItem;
use crate::format::format_float;
use crate::params::ParamSet;
use crate::variable::VariableField;

/// A scalar or list value written on the right-hand side of `key = value`
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValue {
    Bool(bool),
    Float(f64),
    FloatList(Vec<f64>),
    Str(String),
}

impl fmt::Display for ManifestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestValue::Bool(b) => write!(f, "{b}"),
            ManifestValue::Float(v) => f.write_str(&format_float(*v)),
            ManifestValue::FloatList(values) => {
                let items: Vec<String> = values.iter().map(|v| format_float(*v)).collect();
                write!(f, "[{}]", items.join(", "))
            }
            ManifestValue::Str(s) => f.write_str(&quote(s)),
        }
    }
}

impl From<bool> for ManifestValue {
    fn from(value: bool) -> Self {
        ManifestValue::Bool(value)
    }
}

impl From<f64> for ManifestValue {
    fn from(value: f64) -> Self {
        ManifestValue::Float(value)
    }
}

impl From<Vec<f64>> for ManifestValue {
    fn from(values: Vec<f64>) -> Self {
        ManifestValue::FloatList(values)
    }
}

impl From<&str> for ManifestValue {
    fn from(value: &str) -> Self {
        ManifestValue::Str(value.to_string())
    }
}

impl From<String> for ManifestValue {
    fn from(value: String) -> Self {
        ManifestValue::Str(value)
    }
}

/// Variable definitions keyed by parameter name, each in definition order
pub type VariablesSection = BTreeMap<String, Vec<(&'static str, ManifestValue)>>;

/// Build the variables section from a set of variable fields
pub fn variables_section<'a, I>(variables: I) -> VariablesSection
where
    I: IntoIterator<Item = (&'a String, &'a VariableField)>,
{
    variables
        .into_iter()
        .map(|(name, field)| (name.clone(), field.to_config()))
        .collect()
}

/// Serialize one case manifest.
pub fn serialize(
    template_params: &ParamSet,
    variables: &VariablesSection,
    template_file: &str,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("[meta]".to_string());
    lines.push(format!("template_file = {}", quote(template_file)));
    lines.push(String::new());

    lines.push("[template_params]".to_string());
    let mut params: Vec<(&str, f64)> = template_params.iter().collect();
    params.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in params {
        lines.push(format!("{} = {}", key(name), format_float(value)));
    }
    lines.push(String::new());

    lines.push("[variables]".to_string());
    lines.push(String::new());
    for (name, cfg) in variables {
        lines.push(format!("[variables.{}]", key(name)));
        for (k, v) in cfg {
            lines.push(format!("{k} = {v}"));
        }
        lines.push(String::new());
    }

    let mut text = lines.join("\n").trim_end().to_string();
    text.push('\n');
    text
}

/// Everything needed to describe one generated case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseManifest {
    pub template_file: String,
    pub template_params: ParamSet,
    pub variables: VariablesSection,
}

impl CaseManifest {
    /// Manifest for a batch item, recording every variable definition of the run
    pub fn for_item(
        item: &BatchItem,
        variables: &BTreeMap<String, VariableField>,
        template_file: impl Into<String>,
    ) -> Self {
        Self {
            template_file: template_file.into(),
            template_params: item.params.clone(),
            variables: variables_section(variables),
        }
    }

    pub fn render(&self) -> String {
        serialize(&self.template_params, &self.variables, &self.template_file)
    }
}

impl fmt::Display for CaseManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote a string as a JSON string literal, which TOML also accepts as a
/// basic string.
fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Bare keys are written as-is; anything else is quoted.
fn key(name: &str) -> String {
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { name.to_string() } else { quote(name) }
}
