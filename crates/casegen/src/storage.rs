//! Filesystem side of case generation.
//!
//! Existing case directories are never overwritten: they are moved aside to
//! `<name>_backup_<YYYYmmdd_HHMMSS>` first.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Error from a storage operation, with the path it concerned
#[derive(Debug)]
pub struct StorageError {
    pub context: String,
    pub path: PathBuf,
    pub source: io::Error,
}

impl StorageError {
    fn new(context: impl Into<String>, path: &Path, source: io::Error) -> Self {
        Self {
            context: context.into(),
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.context, self.path.display(), self.source)
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Persistence operations needed to lay out case directories
pub trait Storage {
    /// Create a directory and any missing parents
    fn ensure_dir(&self, path: &Path) -> Result<(), StorageError>;

    /// Move an existing file or directory aside. Returns the backup path
    /// when something was moved.
    fn backup_if_exists(&self, path: &Path) -> Result<Option<PathBuf>, StorageError>;

    /// Copy every entry of `template_dir` into `dest_dir`, recursively
    fn copy_template_tree(&self, template_dir: &Path, dest_dir: &Path) -> Result<(), StorageError>;

    /// Replace a file's contents
    fn write_file(&self, path: &Path, contents: &str) -> Result<(), StorageError>;
}

/// [`Storage`] on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn ensure_dir(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path)
            .map_err(|e| StorageError::new("failed to create directory", path, e))
    }

    fn backup_if_exists(&self, path: &Path) -> Result<Option<PathBuf>, StorageError> {
        if fs::symlink_metadata(path).is_err() {
            return Ok(None);
        }
        let stamp = jiff::Zoned::now().strftime("%Y%m%d_%H%M%S").to_string();
        let backup = backup_path(path, &stamp);
        fs::rename(path, &backup)
            .map_err(|e| StorageError::new("failed to back up", path, e))?;
        tracing::info!(
            path = %path.display(),
            backup = %backup.display(),
            "Moved existing case aside"
        );
        Ok(Some(backup))
    }

    fn copy_template_tree(&self, template_dir: &Path, dest_dir: &Path) -> Result<(), StorageError> {
        self.ensure_dir(dest_dir)?;
        let dest_canonical = fs::canonicalize(dest_dir)
            .map_err(|e| StorageError::new("failed to resolve", dest_dir, e))?;
        copy_dir_contents(template_dir, dest_dir, &dest_canonical)
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        atomic_write(path, contents).map_err(|e| StorageError::new("failed to write", path, e))
    }
}

/// First free `<name>_backup_<stamp>[_<n>]` sibling of `path`
fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = path.with_file_name(format!("{name}_backup_{stamp}"));
    if fs::symlink_metadata(&base).is_err() {
        return base;
    }
    (1..)
        .map(|n| path.with_file_name(format!("{name}_backup_{stamp}_{n}")))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .unwrap_or(base)
}

/// Recursive copy that skips the destination and any directory containing
/// it, so an output directory placed inside the template directory is safe.
fn copy_dir_contents(src: &Path, dst: &Path, dest_root: &Path) -> Result<(), StorageError> {
    let entries = fs::read_dir(src).map_err(|e| StorageError::new("failed to read", src, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| StorageError::new("failed to read", src, e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| StorageError::new("failed to inspect", &src_path, e))?;

        if file_type.is_dir() {
            if let Ok(canonical) = fs::canonicalize(&src_path)
                && dest_root.starts_with(&canonical)
            {
                continue;
            }
            fs::create_dir_all(&dst_path)
                .map_err(|e| StorageError::new("failed to create directory", &dst_path, e))?;
            copy_dir_contents(&src_path, &dst_path, dest_root)?;
        } else {
            fs::copy(&src_path, &dst_path)
                .map_err(|e| StorageError::new("failed to copy", &src_path, e))?;
        }
    }
    Ok(())
}

/// Write content to a file atomically using write-then-rename.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_backup_path_is_unique() {
        let dir = tempdir().unwrap();
        let case = dir.path().join("case_001");

        let first = backup_path(&case, "20260101_120000");
        assert_eq!(first, dir.path().join("case_001_backup_20260101_120000"));

        fs::create_dir(&first).unwrap();
        let second = backup_path(&case, "20260101_120000");
        assert_eq!(second, dir.path().join("case_001_backup_20260101_120000_1"));
    }

    #[test]
    fn test_backup_if_exists() {
        let dir = tempdir().unwrap();
        let case = dir.path().join("case_001");
        let storage = FsStorage;

        assert_eq!(storage.backup_if_exists(&case).unwrap(), None);

        fs::create_dir(&case).unwrap();
        fs::write(case.join("input.k"), "old").unwrap();
        let backup = storage.backup_if_exists(&case).unwrap().unwrap();

        assert!(!case.exists());
        assert_eq!(fs::read_to_string(backup.join("input.k")).unwrap(), "old");
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("case_001_backup_"));
    }

    #[test]
    fn test_copy_template_tree_recurses() {
        let src = tempdir().unwrap();
        fs::write(src.path().join("input.template"), "{{ a }}").unwrap();
        fs::create_dir_all(src.path().join("include/mat")).unwrap();
        fs::write(src.path().join("include/mat/steel.k"), "*MAT").unwrap();

        let dst = tempdir().unwrap();
        let case = dst.path().join("case_001");
        FsStorage.copy_template_tree(src.path(), &case).unwrap();

        assert_eq!(fs::read_to_string(case.join("input.template")).unwrap(), "{{ a }}");
        assert_eq!(fs::read_to_string(case.join("include/mat/steel.k")).unwrap(), "*MAT");
    }

    #[test]
    fn test_copy_template_tree_skips_nested_output() {
        let src = tempdir().unwrap();
        fs::write(src.path().join("input.template"), "x").unwrap();
        let case = src.path().join("runs").join("case_001");

        FsStorage.copy_template_tree(src.path(), &case).unwrap();

        assert!(case.join("input.template").exists());
        assert!(!case.join("runs").exists());
    }
}
