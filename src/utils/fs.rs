//! Filesystem probing and copying.
//!
//! The pipeline only needs three operations: existence checks, single-file
//! copies and recursive directory copies. They live behind [`FileProbe`] so
//! the pipeline can run against an in-memory fake.

use anyhow::{Context, Result};
use std::{fs, io, path::Path};

/// Existence checks and overwrite-copies.
pub trait FileProbe {
    /// Whether anything (file, directory, symlink target) exists at `path`.
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Copy a single file, overwriting the destination.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copy a directory tree, overwriting files that already exist.
    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()>;
}

/// [`FileProbe`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn exists(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to stat {}", path.display())),
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::copy(from, to).with_context(|| {
            format!("Failed to copy {} to {}", from.display(), to.display())
        })?;
        Ok(())
    }

    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()> {
        copy_dir_recursively(from, to)
    }
}

/// Recursively copy `src` into `dst`, creating directories as needed.
pub fn copy_dir_recursively(src: &Path, dst: &Path) -> Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)
            .with_context(|| format!("Failed to create directory {}", dst.display()))?;
    }

    for entry in fs::read_dir(src)
        .with_context(|| format!("Failed to read directory {}", src.display()))?
    {
        let entry = entry.context("Invalid directory entry")?;
        let entry_path = entry.path();
        let dest_path = dst.join(entry.file_name());

        // Follows symlinks, so a linked directory is copied as a directory.
        if entry_path.is_dir() {
            copy_dir_recursively(&entry_path, &dest_path)?;
        } else {
            fs::copy(&entry_path, &dest_path).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry_path.display(),
                    dest_path.display()
                )
            })?;
        }
    }

    Ok(())
}
