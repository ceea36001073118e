//! Job files: declarative description of one batch.
//!
//! ```yaml
//! template_dir: templates/beam
//! output_dir: runs/beam
//! prefix: case
//! warn_threshold: 50
//! params:
//!   thickness: 2.0
//! variables:
//!   thickness: { mode: range, min_value: 1.0, max_value: 3.0, step: 0.5 }
//!   load: { mode: discrete, values: [10.0, 20.0, 40.0] }
//! ```
//!
//! Relative paths are resolved against the directory of the job file.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use casegen_core::{DEFAULT_STEP, ParamSet, SweepMode, VariableField, Variables};
use serde::Deserialize;

use crate::catalog::{CatalogError, TemplateCatalog};
use crate::generate::{DEFAULT_PREFIX, DEFAULT_WARN_THRESHOLD, GenerationRequest};

/// Variables generating more values than this are logged as suspicious
pub const LARGE_VARIABLE_THRESHOLD: usize = 100;

/// Errors from loading or resolving a job file
#[derive(Debug)]
pub enum JobError {
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, message: String },
    /// A variable definition fails its definition-time checks
    InvalidVariable { name: String, reason: String },
    Catalog(CatalogError),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Read { path, source } => {
                write!(f, "failed to read job file {}: {source}", path.display())
            }
            JobError::Parse { path, message } => {
                write!(f, "failed to parse job file {}: {message}", path.display())
            }
            JobError::InvalidVariable { name, reason } => {
                write!(f, "invalid variable '{name}': {reason}")
            }
            JobError::Catalog(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobError::Read { source, .. } => Some(source),
            JobError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for JobError {
    fn from(err: CatalogError) -> Self {
        JobError::Catalog(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    Range,
    Discrete,
}

/// Variable definition as written in a job file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    /// Declaring a variable enables it unless stated otherwise
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub mode: ModeName,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub values: Vec<f64>,
}

fn enabled_by_default() -> bool {
    true
}

impl VariableSpec {
    /// Definition-time checks. Disabled variables are not checked.
    pub fn validate(&self, name: &str) -> Result<(), JobError> {
        if !self.enabled {
            return Ok(());
        }
        let invalid = |reason: &str| {
            Err(JobError::InvalidVariable {
                name: name.to_string(),
                reason: reason.to_string(),
            })
        };

        match self.mode {
            ModeName::Range => {
                let (Some(min), Some(max)) = (self.min_value, self.max_value) else {
                    return invalid("range needs both min_value and max_value");
                };
                if !(min < max) {
                    return invalid("min_value must be less than max_value");
                }
                if !(self.step.unwrap_or(DEFAULT_STEP) > 0.0) {
                    return invalid("step must be greater than 0");
                }
            }
            ModeName::Discrete => {
                if self.values.len() < 2 {
                    return invalid("at least 2 discrete values are required");
                }
                let mut sorted = self.values.clone();
                sorted.sort_by(f64::total_cmp);
                if sorted.windows(2).any(|w| w[0] == w[1]) {
                    return invalid("duplicate values detected");
                }
            }
        }
        Ok(())
    }

    pub fn to_field(&self) -> VariableField {
        let mode = match self.mode {
            ModeName::Range => SweepMode::Range {
                min_value: self.min_value,
                max_value: self.max_value,
                step: self.step.unwrap_or(DEFAULT_STEP),
            },
            ModeName::Discrete => SweepMode::Discrete {
                values: self.values.clone(),
            },
        };
        VariableField {
            enabled: self.enabled,
            mode,
        }
    }
}

/// Parsed job file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: usize,
    /// Base value overrides
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSpec>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_warn_threshold() -> usize {
    DEFAULT_WARN_THRESHOLD
}

impl JobFile {
    /// Read a job file, resolving relative paths against its directory
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let content = fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut job = Self::parse(&content).map_err(|message| JobError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        job.template_dir = base.join(&job.template_dir);
        job.output_dir = base.join(&job.output_dir);
        Ok(job)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        serde_saphyr::from_str(content).map_err(|e| e.to_string())
    }

    /// Resolve the job against its template into a generation request.
    ///
    /// Every placeholder of the template becomes a base parameter, in sorted
    /// order, valued from the job's `params`, else the template default,
    /// else `0.0`. Every parameter gets a variable entry, disabled unless
    /// the job declares it.
    pub fn into_request(self) -> Result<GenerationRequest, JobError> {
        let catalog = TemplateCatalog::open(&self.template_dir)?;
        let names = catalog.params()?;

        let defaults = catalog.load_defaults().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring template defaults");
            BTreeMap::new()
        });

        for name in self.params.keys() {
            if !names.contains(name) {
                tracing::warn!(param = %name, "Job sets a parameter the template does not use");
            }
        }
        for (name, spec) in &self.variables {
            if !names.contains(name) {
                tracing::warn!(
                    variable = %name,
                    "Job declares a variable the template does not use"
                );
                continue;
            }
            spec.validate(name)?;
            let count = spec.to_field().value_count();
            if count > LARGE_VARIABLE_THRESHOLD {
                tracing::warn!(variable = %name, count, "Variable generates many values");
            }
        }

        let base_params: ParamSet = names
            .iter()
            .map(|name| {
                let value = self
                    .params
                    .get(name)
                    .or_else(|| defaults.get(name))
                    .copied()
                    .unwrap_or(0.0);
                (name.as_str(), value)
            })
            .collect();

        let variables: Variables = names
            .iter()
            .map(|name| {
                let field = self
                    .variables
                    .get(name)
                    .map(VariableSpec::to_field)
                    .unwrap_or_default();
                (name.clone(), field)
            })
            .collect();

        let prefix = match self.prefix.trim() {
            "" => DEFAULT_PREFIX.to_string(),
            p => p.to_string(),
        };

        Ok(GenerationRequest {
            template_source: catalog.read_template()?,
            template_file_name: catalog.template_file_name().to_string(),
            template_dir: self.template_dir,
            output_dir: self.output_dir,
            prefix,
            warn_threshold: self.warn_threshold,
            base_params,
            variables,
        })
    }
}
