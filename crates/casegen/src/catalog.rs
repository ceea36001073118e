//! Template directory discovery
//!
//! A template directory holds:
//!   input.template      # the text rendered into each case (required)
//!   config.toml         # optional `[template_params]` default values
//!   params_info.json    # optional display names / descriptions
//!   ...                 # any other assets, copied into every case

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

pub const TEMPLATE_FILE_NAME: &str = "input.template";
pub const DEFAULTS_FILE_NAME: &str = "config.toml";
pub const PARAMS_INFO_FILE_NAME: &str = "params_info.json";

static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Errors from reading a template directory
#[derive(Debug)]
pub enum CatalogError {
    /// The directory has no `input.template`
    MissingTemplate(PathBuf),
    Read { path: PathBuf, source: io::Error },
    /// `config.toml` exists but could not be parsed
    Defaults { path: PathBuf, message: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::MissingTemplate(dir) => write!(
                f,
                "template directory does not contain `{TEMPLATE_FILE_NAME}`: {}",
                dir.display()
            ),
            CatalogError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            CatalogError::Defaults { path, message } => {
                write!(f, "failed to load defaults from {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Display metadata for a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    pub description: String,
}

/// Collect the distinct `{{ name }}` placeholders of a template, sorted
pub fn extract_params(template_text: &str) -> BTreeSet<String> {
    PARAM_RE
        .captures_iter(template_text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// A template directory that is known to contain `input.template`
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    dir: PathBuf,
    template_path: PathBuf,
}

impl TemplateCatalog {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let dir = dir.into();
        let template_path = dir.join(TEMPLATE_FILE_NAME);
        if !template_path.is_file() {
            return Err(CatalogError::MissingTemplate(dir));
        }
        Ok(Self { dir, template_path })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn template_file_name(&self) -> &'static str {
        TEMPLATE_FILE_NAME
    }

    pub fn read_template(&self) -> Result<String, CatalogError> {
        fs::read_to_string(&self.template_path).map_err(|source| CatalogError::Read {
            path: self.template_path.clone(),
            source,
        })
    }

    /// Parameter names used by the template, sorted
    pub fn params(&self) -> Result<Vec<String>, CatalogError> {
        Ok(extract_params(&self.read_template()?).into_iter().collect())
    }

    /// Default values from the `[template_params]` table of `config.toml`.
    ///
    /// A missing file yields no defaults. Integers and booleans are widened
    /// to floats, numeric strings are parsed, anything else becomes `0.0`.
    pub fn load_defaults(&self) -> Result<BTreeMap<String, f64>, CatalogError> {
        let path = self.dir.join(DEFAULTS_FILE_NAME);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        let table: toml::Table = content.parse().map_err(|e: toml::de::Error| {
            CatalogError::Defaults {
                path: path.clone(),
                message: e.message().to_string(),
            }
        })?;

        let Some(params) = table.get("template_params").and_then(|v| v.as_table()) else {
            return Ok(BTreeMap::new());
        };

        Ok(params
            .iter()
            .map(|(name, value)| (name.clone(), coerce_default(name, value)))
            .collect())
    }

    /// Display metadata from `params_info.json`.
    ///
    /// Accepts either `{"params": {...}}` or a bare map whose entries are a
    /// description string or `{"name": ..., "description": ...}`. Unreadable
    /// or malformed files yield no metadata.
    pub fn load_params_info(&self) -> BTreeMap<String, ParamInfo> {
        let path = self.dir.join(PARAMS_INFO_FILE_NAME);
        let Ok(content) = fs::read_to_string(&path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(raw) => parse_params_info(&raw),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring malformed params info"
                );
                BTreeMap::new()
            }
        }
    }
}

fn coerce_default(name: &str, value: &toml::Value) -> f64 {
    match value {
        toml::Value::Float(v) => *v,
        toml::Value::Integer(v) => *v as f64,
        toml::Value::Boolean(b) => f64::from(u8::from(*b)),
        toml::Value::String(s) => s.trim().parse().unwrap_or_else(|_| {
            tracing::debug!(param = name, value = %s, "Non-numeric default, using 0.0");
            0.0
        }),
        other => {
            tracing::debug!(
                param = name,
                kind = other.type_str(),
                "Unsupported default, using 0.0"
            );
            0.0
        }
    }
}

fn parse_params_info(raw: &serde_json::Value) -> BTreeMap<String, ParamInfo> {
    let params = match raw.get("params") {
        Some(inner) if inner.is_object() => inner,
        _ => raw,
    };
    let Some(entries) = params.as_object() else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter_map(|(key, value)| {
            let info = match value {
                serde_json::Value::Object(obj) => ParamInfo {
                    name: obj
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or(key)
                        .to_string(),
                    description: obj
                        .get("description")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                },
                serde_json::Value::String(description) => ParamInfo {
                    name: key.clone(),
                    description: description.clone(),
                },
                _ => return None,
            };
            Some((key.clone(), info))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn template_dir(template: &str) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TEMPLATE_FILE_NAME), template).unwrap();
        dir
    }

    #[test]
    fn test_extract_params() {
        let text = "*PART\n{{ thickness }} {{load}}\n{{  thickness  }} {{ 9bad }} {{ a.b }}";
        let params: Vec<String> = extract_params(text).into_iter().collect();
        assert_eq!(params, vec!["load", "thickness"]);
    }

    #[test]
    fn test_open_requires_template() {
        let dir = tempdir().unwrap();
        let err = TemplateCatalog::open(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingTemplate(_)));
    }

    #[test]
    fn test_params_sorted() {
        let dir = template_dir("{{ z }} {{ a }} {{ m }}");
        let catalog = TemplateCatalog::open(dir.path()).unwrap();
        assert_eq!(catalog.params().unwrap(), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_load_defaults() {
        let dir = template_dir("{{ a }}");
        fs::write(
            dir.path().join(DEFAULTS_FILE_NAME),
            "[template_params]\na = 1.5\nb = 3\nc = \"2.5\"\nd = true\ne = \"abc\"\n",
        )
        .unwrap();

        let defaults = TemplateCatalog::open(dir.path())
            .unwrap()
            .load_defaults()
            .unwrap();
        assert_eq!(defaults["a"], 1.5);
        assert_eq!(defaults["b"], 3.0);
        assert_eq!(defaults["c"], 2.5);
        assert_eq!(defaults["d"], 1.0);
        assert_eq!(defaults["e"], 0.0);
    }

    #[test]
    fn test_load_defaults_missing_and_malformed() {
        let dir = template_dir("{{ a }}");
        let catalog = TemplateCatalog::open(dir.path()).unwrap();
        assert!(catalog.load_defaults().unwrap().is_empty());

        fs::write(dir.path().join(DEFAULTS_FILE_NAME), "[template_params\n").unwrap();
        assert!(matches!(
            catalog.load_defaults(),
            Err(CatalogError::Defaults { .. })
        ));
    }

    #[test]
    fn test_load_params_info_shapes() {
        let dir = template_dir("{{ a }}");
        let catalog = TemplateCatalog::open(dir.path()).unwrap();
        assert!(catalog.load_params_info().is_empty());

        fs::write(
            dir.path().join(PARAMS_INFO_FILE_NAME),
            r#"{"params": {"t": {"name": "Thickness", "description": "Shell thickness"}, "f": "Force", "n": 3}}"#,
        )
        .unwrap();
        let info = catalog.load_params_info();
        assert_eq!(info.len(), 2);
        assert_eq!(info["t"].name, "Thickness");
        assert_eq!(info["t"].description, "Shell thickness");
        assert_eq!(info["f"].name, "f");
        assert_eq!(info["f"].description, "Force");

        fs::write(dir.path().join(PARAMS_INFO_FILE_NAME), r#"{"t": {"description": 5}}"#).unwrap();
        let info = catalog.load_params_info();
        assert_eq!(info["t"].name, "t");
        assert_eq!(info["t"].description, "");

        fs::write(dir.path().join(PARAMS_INFO_FILE_NAME), "not json").unwrap();
        assert!(catalog.load_params_info().is_empty());
    }
}
