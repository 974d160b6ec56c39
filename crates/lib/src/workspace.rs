//! Workspace root resolution and per-tag context paths.
//!
//! The workspace root is the only directory slipway is allowed to delete
//! and recreate under. Every build context lives below it, one directory
//! per tag, so invocations targeting disjoint tags never touch the same
//! paths.

use std::path::{Path, PathBuf};

use crate::consts::{APP_NAME, CONTEXTS_DIRNAME, WORKSPACE_ENV};
use crate::tag::Tag;

/// The resolved workspace root of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
  root: PathBuf,
}

impl Workspace {
  /// Resolve the workspace root.
  ///
  /// Precedence: `SLIPWAY_WORKSPACE` env var, then the manifest's
  /// `workspace` field (resolved against the manifest's directory when
  /// relative), then `.slipway` next to the manifest.
  pub fn resolve(manifest_path: &Path, configured: Option<&Path>) -> Self {
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let root = if let Ok(env_root) = std::env::var(WORKSPACE_ENV) {
      PathBuf::from(env_root)
    } else if let Some(configured) = configured {
      if configured.is_absolute() {
        configured.to_path_buf()
      } else {
        base.join(configured)
      }
    } else {
      base.join(format!(".{}", APP_NAME))
    };

    Workspace { root }
  }

  /// A workspace rooted at an explicit path. Used by tests and by callers
  /// that already resolved the root themselves.
  pub fn at(root: PathBuf) -> Self {
    Workspace { root }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// The build context directory for `tag`.
  ///
  /// Owned exclusively by the invocation holding the workspace lock; the
  /// preparer deletes and recreates it wholesale.
  pub fn context_dir(&self, tag: &Tag) -> PathBuf {
    self.root.join(CONTEXTS_DIRNAME).join(tag.context_dirname())
  }

  /// Path of the lock file guarding this workspace.
  pub fn lock_path(&self) -> PathBuf {
    self.root.join(".lock")
  }
}
