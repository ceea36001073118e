//! Parameter sweep engine for batch case generation
//!
//! This crate expands a set of simulation parameters, some of which sweep
//! over a range or a discrete list, into an ordered batch of concrete
//! parameter combinations, and serializes the manifest that makes each
//! generated case reproducible.
//!
//! ```
//! use casegen_core::{ParamSet, VariableField, Variables, BatchPlan};
//!
//! let base: ParamSet = [("x", 1.0), ("y", 2.0)].into_iter().collect();
//! let variables = Variables::from([("x".to_string(), VariableField::range(0.0, 1.0, 0.5))]);
//!
//! let plan = BatchPlan::validate(&base, &variables).unwrap();
//! assert_eq!(plan.len(), 3);
//! for item in &plan {
//!     assert_eq!(item.params.get("y"), Some(2.0));
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod batch;
pub mod error;
pub mod format;
pub mod manifest;
pub mod params;
pub mod variable;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use batch::{
    Axis, BatchItem, BatchIter, BatchPlan, Variables, estimate_batch_size, generate_batch,
};
pub use error::BatchError;
pub use manifest::{CaseManifest, ManifestValue, VariablesSection, variables_section};
pub use params::ParamSet;
pub use variable::{
    DEFAULT_STEP, MAX_GENERATED_VALUES, RANGE_TOLERANCE, SweepMode, VariableField,
};
