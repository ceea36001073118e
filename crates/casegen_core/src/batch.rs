//! Batch planning: expand base parameters and variable fields into the full,
//! deterministically ordered list of cases.
//!
//! Axes follow the order of the base parameters. Enumeration is row-major:
//! the last axis varies fastest, so for `x ∈ {0, 1}` then `y ∈ {a, b}` the
//! cases come out as `(0,a) (0,b) (1,a) (1,b)`. Case indices start at 1.

use std::collections::BTreeMap;

use crate::error::{BatchError, Result};
use crate::params::ParamSet;
use crate::variable::VariableField;

/// Variable definitions keyed by parameter name
pub type Variables = BTreeMap<String, VariableField>;

/// One concrete parameter combination
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    /// 1-based position in the batch
    pub index: usize,
    /// One value per base parameter, in base order
    pub params: ParamSet,
}

/// Number of cases `generate_batch` would produce.
///
/// Parameters without an enabled variable field count as a factor of 1.
/// Variable fields naming no base parameter are ignored. A result of 0 means
/// some enabled variable currently generates no values.
pub fn estimate_batch_size(base_params: &ParamSet, variables: &Variables) -> usize {
    base_params
        .names()
        .fold(1usize, |total, name| match variables.get(name) {
            Some(field) if field.enabled => total.saturating_mul(field.value_count()),
            _ => total,
        })
}

/// Materialize every case of the batch.
///
/// The length always equals [`estimate_batch_size`] for the same inputs.
pub fn generate_batch(base_params: &ParamSet, variables: &Variables) -> Vec<BatchItem> {
    BatchPlan::new(base_params, variables).iter().collect()
}

/// Values one parameter takes across the batch
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<f64>,
    /// True when the values come from an enabled variable field
    pub variable: bool,
}

/// Snapshot of a batch: the value axes resolved once, enumerated lazily.
///
/// Building a plan copies the generated values out of the variable fields,
/// so later edits to those fields do not affect it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    axes: Vec<Axis>,
    strides: Vec<usize>,
    len: usize,
}

impl BatchPlan {
    pub fn new(base_params: &ParamSet, variables: &Variables) -> Self {
        let axes: Vec<Axis> = base_params
            .iter()
            .map(|(name, base)| match variables.get(name) {
                Some(field) if field.enabled => Axis {
                    name: name.to_string(),
                    values: field.generate_values(),
                    variable: true,
                },
                _ => Axis {
                    name: name.to_string(),
                    values: vec![base],
                    variable: false,
                },
            })
            .collect();

        let shape: Vec<usize> = axes.iter().map(|a| a.values.len()).collect();
        let len = shape.iter().fold(1usize, |acc, &n| acc.saturating_mul(n));
        let strides = compute_strides(&shape);
        Self { axes, strides, len }
    }

    /// Build a plan, rejecting inputs that would produce no cases.
    pub fn validate(base_params: &ParamSet, variables: &Variables) -> Result<Self> {
        for name in base_params.names() {
            if let Some(field) = variables.get(name)
                && field.enabled
                && field.value_count() == 0
            {
                return Err(BatchError::EmptyVariable {
                    name: name.to_string(),
                });
            }
        }

        let plan = Self::new(base_params, variables);
        if plan.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        Ok(plan)
    }

    /// Total number of cases
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All axes in base-parameter order
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axes driven by an enabled variable field
    pub fn enabled_variables(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter().filter(|a| a.variable)
    }

    /// Case at the given 1-based index
    pub fn get(&self, index: usize) -> Option<BatchItem> {
        if index == 0 || index > self.len {
            return None;
        }
        let mut remaining = index - 1;
        let mut params = ParamSet::with_capacity(self.axes.len());
        for (axis, &stride) in self.axes.iter().zip(&self.strides) {
            let position = remaining / stride;
            remaining %= stride;
            params.insert(axis.name.as_str(), axis.values[position]);
        }
        Some(BatchItem { index, params })
    }

    /// Lazily enumerate the cases. Each call starts again from case 1.
    pub fn iter(&self) -> BatchIter<'_> {
        BatchIter {
            plan: self,
            counters: vec![0; self.axes.len()],
            next_index: 1,
        }
    }
}

impl<'a> IntoIterator for &'a BatchPlan {
    type Item = BatchItem;
    type IntoIter = BatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major strides for the given axis lengths
fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1].saturating_mul(shape[i + 1]);
    }
    strides
}

/// Odometer over the axes of a [`BatchPlan`]
#[derive(Debug, Clone)]
pub struct BatchIter<'a> {
    plan: &'a BatchPlan,
    counters: Vec<usize>,
    next_index: usize,
}

impl Iterator for BatchIter<'_> {
    type Item = BatchItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index > self.plan.len {
            return None;
        }

        let params = self
            .plan
            .axes
            .iter()
            .zip(&self.counters)
            .map(|(axis, &i)| (axis.name.as_str(), axis.values[i]))
            .collect();
        let item = BatchItem {
            index: self.next_index,
            params,
        };
        self.next_index += 1;

        // Last axis varies fastest
        for (counter, axis) in self.counters.iter_mut().zip(&self.plan.axes).rev() {
            *counter += 1;
            if *counter < axis.values.len() {
                break;
            }
            *counter = 0;
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next_index > self.plan.len {
            0
        } else {
            self.plan.len - self.next_index + 1
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BatchIter<'_> {}
