//! Batch case generator for templated simulation inputs
//!
//! Reads a template directory and a job file, expands the job's variables
//! into a batch of parameter combinations with `casegen_core`, and writes
//! one case directory per combination: a copy of the template assets, the
//! rendered input deck, and a manifest recording how the case was made.

// ============================================================================
// Modules
// ============================================================================

pub mod catalog;
pub mod generate;
pub mod job;
pub mod logging;
pub mod render;
pub mod storage;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use catalog::{CatalogError, ParamInfo, TemplateCatalog, extract_params};
pub use generate::{
    GenerationError, GenerationProgress, GenerationReport, GenerationRequest, case_dir_name,
    generate_cases,
};
pub use job::{JobError, JobFile, VariableSpec};
pub use logging::init_logging;
pub use render::{HandlebarsRenderer, RenderError, Renderer};
pub use storage::{FsStorage, Storage, StorageError};
