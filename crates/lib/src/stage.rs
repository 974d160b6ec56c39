//! Workspace preparer: destructive staging of the build context.
//!
//! On success the context directory contains exactly the files named by the
//! staging set, nothing else. Anything a previous run left there is removed
//! first, so callers must never rely on content surviving across runs.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::util::fs::copy_recursive;

/// One `(source path, destination name)` pair of the staging set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingEntry {
  /// Path to copy, relative to the manifest's directory or absolute.
  pub source: PathBuf,

  /// Name the copy gets inside the build context.
  pub dest: String,
}

/// Errors that can occur while preparing the build context.
#[derive(Debug, Error)]
pub enum StageError {
  /// A staging source does not exist.
  #[error("staging source not found: {0}")]
  SourceMissing(PathBuf),

  /// Removal or copy was blocked by the filesystem.
  #[error("permission denied for {path}")]
  PermissionDenied {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The context directory escapes the workspace root. Refused so a bad
  /// configuration cannot make the destructive reset delete arbitrary paths.
  #[error("context directory {dest} is outside the workspace root {root}")]
  OutsideWorkspace { dest: PathBuf, root: PathBuf },

  /// Any other I/O failure.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

/// Result of a successful prepare.
#[derive(Debug, Clone, Serialize)]
pub struct PrepareSummary {
  /// Number of staging entries placed into the context.
  pub entries: usize,

  /// Total regular files copied.
  pub files: u64,
}

/// Stage `entries` into `context_dir`, resetting it first.
///
/// The context directory is removed recursively when it exists, recreated,
/// and each staging source is copied to its destination name. Permissions
/// are preserved where the filesystem supports it.
///
/// All sources are checked for existence before anything is deleted, so a
/// missing source never costs a previously staged context. If a copy fails
/// partway the context is removed again, leaving it fully absent rather
/// than silently incomplete.
///
/// # Errors
///
/// [`StageError::SourceMissing`] if a source path does not exist,
/// [`StageError::PermissionDenied`] if removal or copy is blocked, and
/// [`StageError::OutsideWorkspace`] if `context_dir` does not resolve to a
/// path under `workspace_root`. All are fatal for the invocation.
pub fn prepare(entries: &[StagingEntry], context_dir: &Path, workspace_root: &Path) -> Result<PrepareSummary, StageError> {
  info!(context = %context_dir.display(), entries = entries.len(), "preparing build context");

  for entry in entries {
    if !entry.source.exists() {
      return Err(StageError::SourceMissing(entry.source.clone()));
    }
  }

  std::fs::create_dir_all(workspace_root).map_err(|e| permission_or_io(workspace_root, e))?;
  ensure_within(workspace_root, context_dir)?;

  if context_dir.exists() {
    debug!(context = %context_dir.display(), "removing stale context");
    std::fs::remove_dir_all(context_dir).map_err(|e| permission_or_io(context_dir, e))?;
  }
  std::fs::create_dir_all(context_dir).map_err(|e| permission_or_io(context_dir, e))?;

  let mut files = 0;
  for entry in entries {
    let target = context_dir.join(&entry.dest);
    debug!(source = %entry.source.display(), dest = %entry.dest, "staging");

    match copy_recursive(&entry.source, &target) {
      Ok(copied) => files += copied,
      Err(e) => {
        // Leave the context fully absent instead of half-staged.
        let _ = std::fs::remove_dir_all(context_dir);
        return Err(permission_or_io(&entry.source, e));
      }
    }
  }

  info!(entries = entries.len(), files, "build context ready");

  Ok(PrepareSummary {
    entries: entries.len(),
    files,
  })
}

/// Reject context directories that resolve outside the workspace root.
///
/// The deepest existing ancestor of `dest` is canonicalized and compared,
/// so symlinked escapes are caught without creating anything outside the
/// root first.
fn ensure_within(root: &Path, dest: &Path) -> Result<(), StageError> {
  let canon_root = dunce::canonicalize(root)?;

  let mut probe = dest;
  let existing = loop {
    if probe.exists() {
      break probe;
    }
    probe = probe.parent().ok_or_else(|| StageError::OutsideWorkspace {
      dest: dest.to_path_buf(),
      root: root.to_path_buf(),
    })?;
  };

  let canon_existing = dunce::canonicalize(existing)?;
  let escapes = !canon_existing.starts_with(&canon_root);
  // The reset deletes the context recursively, so the root itself (or a
  // symlink resolving to it) is never an acceptable context directory.
  let is_root_itself = dest.exists() && canon_existing == canon_root;

  if escapes || is_root_itself {
    return Err(StageError::OutsideWorkspace {
      dest: dest.to_path_buf(),
      root: root.to_path_buf(),
    });
  }

  Ok(())
}

fn permission_or_io(path: &Path, err: io::Error) -> StageError {
  if err.kind() == io::ErrorKind::PermissionDenied {
    StageError::PermissionDenied {
      path: path.to_path_buf(),
      source: err,
    }
  } else {
    StageError::Io(err)
  }
}
