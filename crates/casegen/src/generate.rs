//! Batch generation: turn a validated request into case directories.
//!
//! Output layout for a three-case batch with prefix `case`:
//!   <output_dir>/
//!     case_001/
//!       input.template      # copied template assets
//!       input.k             # rendered input
//!       config.toml         # manifest for this case
//!     case_002/
//!     case_003/
//!
//! Cases are generated one at a time. The first failing case aborts the run;
//! the error carries the cases completed before it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use casegen_core::{BatchError, BatchItem, BatchPlan, CaseManifest, ParamSet, Variables};

use crate::render::{RenderError, Renderer};
use crate::storage::{Storage, StorageError};

/// Rendered input file written into every case
pub const RENDERED_FILE_NAME: &str = "input.k";
/// Manifest file written into every case
pub const MANIFEST_FILE_NAME: &str = "config.toml";
pub const DEFAULT_PREFIX: &str = "case";
/// Batches larger than this need explicit confirmation
pub const DEFAULT_WARN_THRESHOLD: usize = 50;

/// Everything needed to generate one batch
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Directory whose contents are copied into every case
    pub template_dir: PathBuf,
    /// Template file name recorded in manifests
    pub template_file_name: String,
    /// Template text handed to the renderer
    pub template_source: String,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub warn_threshold: usize,
    /// Base values in axis order
    pub base_params: ParamSet,
    /// Variable definitions, one per tracked parameter
    pub variables: Variables,
}

impl GenerationRequest {
    /// Validate and expand the request into its batch
    pub fn plan(&self) -> Result<BatchPlan, BatchError> {
        BatchPlan::validate(&self.base_params, &self.variables)
    }
}

/// `<prefix>_<index>` with the index zero-padded to at least three digits,
/// or to the width of `total` if that is wider.
pub fn case_dir_name(prefix: &str, index: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{prefix}_{index:0width$}")
}

/// Progress tracking for a generation run.
///
/// Clones share the same counters, so another thread can watch progress or
/// request cancellation while cases are being written.
#[derive(Debug, Clone)]
pub struct GenerationProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl GenerationProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the counters for a new run. Cancellation is left untouched.
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Stop before the next case
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Outcome of a run that was not aborted by an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Case directories written, in batch order
    pub created: Vec<PathBuf>,
    /// Cases in the batch
    pub total: usize,
    /// True when the run stopped early on request
    pub cancelled: bool,
}

/// Failure while producing a single case
#[derive(Debug)]
pub enum CaseError {
    Storage(StorageError),
    Render(RenderError),
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Storage(e) => write!(f, "{e}"),
            CaseError::Render(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaseError::Storage(e) => Some(e),
            CaseError::Render(e) => Some(e),
        }
    }
}

impl From<StorageError> for CaseError {
    fn from(err: StorageError) -> Self {
        CaseError::Storage(err)
    }
}

impl From<RenderError> for CaseError {
    fn from(err: RenderError) -> Self {
        CaseError::Render(err)
    }
}

#[derive(Debug)]
pub enum GenerationError {
    /// The request would produce no cases; nothing was written
    Validation(BatchError),
    /// The batch exceeded the warning threshold and was not confirmed
    Declined { total: usize },
    /// The output directory could not be prepared
    Storage(StorageError),
    /// A case failed; `created` lists the cases finished before it
    Case {
        case: String,
        created: Vec<PathBuf>,
        source: CaseError,
    },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Validation(e) => write!(f, "validation error: {e}"),
            GenerationError::Declined { total } => {
                write!(f, "generation of {total} cases was not confirmed")
            }
            GenerationError::Storage(e) => write!(f, "{e}"),
            GenerationError::Case {
                case,
                created,
                source,
            } => write!(
                f,
                "generation failed at {case} after {} completed case(s): {source}",
                created.len()
            ),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Validation(e) => Some(e),
            GenerationError::Storage(e) => Some(e),
            GenerationError::Case { source, .. } => Some(source),
            GenerationError::Declined { .. } => None,
        }
    }
}

impl From<BatchError> for GenerationError {
    fn from(err: BatchError) -> Self {
        GenerationError::Validation(err)
    }
}

/// Generate every case of `request`.
///
/// Validation happens before anything touches the filesystem. When the
/// batch is larger than `warn_threshold`, `confirm` is asked with the case
/// count and generation proceeds only if it returns true.
pub fn generate_cases<S, R, F>(
    request: &GenerationRequest,
    storage: &S,
    renderer: &R,
    progress: &GenerationProgress,
    confirm: F,
) -> Result<GenerationReport, GenerationError>
where
    S: Storage,
    R: Renderer,
    F: FnOnce(usize) -> bool,
{
    let plan = request.plan()?;
    let total = plan.len();

    if total > request.warn_threshold && !confirm(total) {
        return Err(GenerationError::Declined { total });
    }

    tracing::info!(
        total,
        output_dir = %request.output_dir.display(),
        variables = plan.enabled_variables().count(),
        "Generating batch"
    );

    storage
        .ensure_dir(&request.output_dir)
        .map_err(GenerationError::Storage)?;
    progress.reset(total);

    let mut created = Vec::with_capacity(total);
    let mut cancelled = false;

    for item in &plan {
        if progress.is_cancelled() {
            cancelled = true;
            break;
        }

        let name = case_dir_name(&request.prefix, item.index, total);
        let case_dir = request.output_dir.join(&name);
        tracing::info!("Generating {}/{}: {}", item.index, total, name);

        if let Err(source) = generate_case(request, &item, &case_dir, storage, renderer) {
            tracing::error!(case = %case_dir.display(), error = %source, "Case generation failed");
            return Err(GenerationError::Case {
                case: name,
                created,
                source,
            });
        }

        created.push(case_dir);
        progress.increment();
    }

    if cancelled {
        tracing::warn!(created = created.len(), total, "Generation cancelled");
    } else {
        tracing::info!(created = created.len(), "Generation complete");
    }

    Ok(GenerationReport {
        created,
        total,
        cancelled,
    })
}

fn generate_case<S: Storage, R: Renderer>(
    request: &GenerationRequest,
    item: &BatchItem,
    case_dir: &Path,
    storage: &S,
    renderer: &R,
) -> Result<(), CaseError> {
    storage.backup_if_exists(case_dir)?;
    storage.ensure_dir(case_dir)?;
    storage.copy_template_tree(&request.template_dir, case_dir)?;

    let rendered = renderer.render(&request.template_source, &item.params)?;
    storage.write_file(&case_dir.join(RENDERED_FILE_NAME), &rendered)?;

    let manifest = CaseManifest::for_item(item, &request.variables, &request.template_file_name);
    storage.write_file(&case_dir.join(MANIFEST_FILE_NAME), &manifest.render())?;
    Ok(())
}
