//! Variable field definitions: how a single parameter sweeps.

use crate::format::format_general;
use crate::manifest::ManifestValue;

/// Slack added to the upper bound of a range so that accumulated binary
/// rounding does not drop the last value (`0..1 step 0.1` includes `1.0`).
pub const RANGE_TOLERANCE: f64 = 1e-12;

/// Hard cap on the number of values a single range may generate
pub const MAX_GENERATED_VALUES: usize = 1_000_000;

/// Step used when a range does not give one
pub const DEFAULT_STEP: f64 = 1.0;

/// Decimal digits kept on range-generated values
const ROUND_DECIMALS: usize = 10;

/// How a variable field produces its values
#[derive(Debug, Clone, PartialEq)]
pub enum SweepMode {
    /// Linear stepping from `min_value` to `max_value` (inclusive)
    Range {
        min_value: Option<f64>,
        max_value: Option<f64>,
        step: f64,
    },
    /// Explicit list of values, used in declaration order
    Discrete { values: Vec<f64> },
}

impl SweepMode {
    /// Name written to manifests (`"range"` / `"discrete"`)
    pub fn name(&self) -> &'static str {
        match self {
            SweepMode::Range { .. } => "range",
            SweepMode::Discrete { .. } => "discrete",
        }
    }
}

impl Default for SweepMode {
    fn default() -> Self {
        SweepMode::Range {
            min_value: None,
            max_value: None,
            step: DEFAULT_STEP,
        }
    }
}

/// Sweep definition attached to one parameter.
///
/// A disabled field has no effect on the batch: the parameter keeps its
/// fixed base value. Fields are plain values; the batch planner takes its
/// own snapshot of the generated values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableField {
    pub enabled: bool,
    pub mode: SweepMode,
}

impl VariableField {
    /// Enabled range sweep from `min` to `max` (inclusive) by `step`
    pub fn range(min: f64, max: f64, step: f64) -> Self {
        Self {
            enabled: true,
            mode: SweepMode::Range {
                min_value: Some(min),
                max_value: Some(max),
                step,
            },
        }
    }

    /// Enabled discrete sweep over `values`
    pub fn discrete(values: impl Into<Vec<f64>>) -> Self {
        Self {
            enabled: true,
            mode: SweepMode::Discrete {
                values: values.into(),
            },
        }
    }

    /// Same definition with `enabled` cleared
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Generate the concrete values this field sweeps over.
    ///
    /// Disabled fields and malformed ranges (missing bound, `step <= 0`,
    /// `min > max`) yield an empty list. Discrete values are returned as
    /// declared, duplicates included.
    pub fn generate_values(&self) -> Vec<f64> {
        if !self.enabled {
            return Vec::new();
        }
        match &self.mode {
            SweepMode::Discrete { values } => values.clone(),
            SweepMode::Range {
                min_value,
                max_value,
                step,
            } => match (min_value, max_value) {
                (Some(min), Some(max)) => {
                    let count = range_count(*min, *max, *step);
                    (0..count)
                        .map(|i| round_decimals(range_point(*min, *step, i)))
                        .collect()
                }
                _ => Vec::new(),
            },
        }
    }

    /// Number of values [`generate_values`](Self::generate_values) returns,
    /// without building the list.
    pub fn value_count(&self) -> usize {
        if !self.enabled {
            return 0;
        }
        match &self.mode {
            SweepMode::Discrete { values } => values.len(),
            SweepMode::Range {
                min_value: Some(min),
                max_value: Some(max),
                step,
            } => range_count(*min, *max, *step),
            SweepMode::Range { .. } => 0,
        }
    }

    /// Canonical key/value view of the definition, in manifest order
    pub fn to_config(&self) -> Vec<(&'static str, ManifestValue)> {
        let mut cfg = vec![
            ("enabled", ManifestValue::Bool(self.enabled)),
            ("mode", ManifestValue::from(self.mode.name())),
        ];
        match &self.mode {
            SweepMode::Range {
                min_value,
                max_value,
                step,
            } => {
                if let Some(min) = min_value {
                    cfg.push(("min_value", ManifestValue::Float(*min)));
                }
                if let Some(max) = max_value {
                    cfg.push(("max_value", ManifestValue::Float(*max)));
                }
                cfg.push(("step", ManifestValue::Float(*step)));
            }
            SweepMode::Discrete { values } => {
                cfg.push(("values", ManifestValue::FloatList(values.clone())));
            }
        }
        cfg
    }

    /// One-line summary for listings, e.g. `5 values (0-1, step=0.25)`.
    /// Empty for disabled fields.
    pub fn badge_text(&self) -> String {
        if !self.enabled {
            return String::new();
        }
        match &self.mode {
            SweepMode::Range {
                min_value,
                max_value,
                step,
            } => {
                let bound =
                    |v: &Option<f64>| v.map_or_else(|| "?".to_string(), |v| format_general(v, 3));
                format!(
                    "{} values ({}-{}, step={})",
                    self.value_count(),
                    bound(min_value),
                    bound(max_value),
                    format_general(*step, 3)
                )
            }
            SweepMode::Discrete { values } => match values.as_slice() {
                [first, .., last] if values.len() > 3 => format!(
                    "{} values [{}, ..., {}]",
                    values.len(),
                    format_general(*first, 3),
                    format_general(*last, 3)
                ),
                _ => {
                    let shown: Vec<String> = values.iter().map(|v| format_general(*v, 3)).collect();
                    format!("{} values [{}]", values.len(), shown.join(", "))
                }
            },
        }
    }
}

/// `i`-th point of a range. Computed from the start rather than by repeated
/// addition so that error does not accumulate along the sweep.
fn range_point(min: f64, step: f64, i: usize) -> f64 {
    min + step * i as f64
}

/// Number of points `min + i*step` not exceeding `max + RANGE_TOLERANCE`,
/// capped at [`MAX_GENERATED_VALUES`].
fn range_count(min: f64, max: f64, step: f64) -> usize {
    // `!(step > 0.0)` also rejects NaN
    if !(step > 0.0) {
        return 0;
    }
    let limit = max + RANGE_TOLERANCE;
    let span = ((limit - min) / step).floor();
    if !(span >= 0.0) {
        return 0;
    }
    let mut count = (span as usize).saturating_add(1).min(MAX_GENERATED_VALUES);

    // The closed form can be off by one at the boundary; settle it against
    // the same comparison the generator uses.
    while count > 0 && range_point(min, step, count - 1) > limit {
        count -= 1;
    }
    while count < MAX_GENERATED_VALUES && range_point(min, step, count) <= limit {
        count += 1;
    }
    count
}

/// Round to [`ROUND_DECIMALS`] decimal digits to strip stepping noise.
/// Correctly rounded at any magnitude.
fn round_decimals(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.prec$}", prec = ROUND_DECIMALS).parse().unwrap_or(value)
}
