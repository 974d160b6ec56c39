//! Pipeline manifest loading and validation.
//!
//! The manifest (`slipway.json`) is the single configuration input of an
//! invocation: the tag to build under, the staging set to copy into the
//! build context, and optionally the workspace root. There is no other
//! persisted configuration; each invocation carries its own manifest value
//! instead of a process-wide singleton.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::stage::StagingEntry;
use crate::tag::Tag;

/// Errors that can occur while loading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// Manifest file does not exist.
  #[error("manifest not found: {0}")]
  NotFound(PathBuf),

  /// Manifest file could not be read.
  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Manifest is not valid JSON or a tag/entry failed to parse.
  #[error("failed to parse manifest {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// The staging set is empty.
  #[error("manifest declares no staging entries")]
  EmptyStagingSet,

  /// Two staging entries map to the same destination name.
  #[error("duplicate staging destination: {0}")]
  DuplicateDest(String),

  /// A staging destination is empty or escapes the context directory.
  #[error("invalid staging destination: {0:?}")]
  InvalidDest(String),
}

/// The parsed contents of a `slipway.json` manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineManifest {
  /// Tag the built image is labeled with. Overridable per invocation.
  pub tag: Tag,

  /// Source paths to copy into the build context, in order.
  pub staging: Vec<StagingEntry>,

  /// Workspace root holding build contexts. Resolved against the manifest's
  /// directory when relative; defaults to `.slipway` next to the manifest.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub workspace: Option<PathBuf>,
}

impl PipelineManifest {
  /// Load and validate a manifest from a JSON file.
  ///
  /// # Errors
  ///
  /// Returns a [`ManifestError`] if the file is missing or unreadable, the
  /// JSON is malformed, the staging set is empty, or destination names are
  /// not unique.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    if !path.exists() {
      return Err(ManifestError::NotFound(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let manifest: PipelineManifest = serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    manifest.validate()?;

    debug!(
      tag = %manifest.tag,
      entries = manifest.staging.len(),
      "manifest loaded"
    );

    Ok(manifest)
  }

  /// Staging entries with relative sources resolved against `base`
  /// (normally the manifest's directory).
  pub fn resolved_staging(&self, base: &Path) -> Vec<StagingEntry> {
    self
      .staging
      .iter()
      .map(|entry| StagingEntry {
        source: if entry.source.is_absolute() {
          entry.source.clone()
        } else {
          base.join(&entry.source)
        },
        dest: entry.dest.clone(),
      })
      .collect()
  }

  /// Validate the staging set invariants.
  pub fn validate(&self) -> Result<(), ManifestError> {
    if self.staging.is_empty() {
      return Err(ManifestError::EmptyStagingSet);
    }

    let mut seen = HashSet::new();
    for entry in &self.staging {
      if entry.dest.is_empty() || entry.dest.contains('/') || entry.dest.contains('\\') || entry.dest.contains("..") {
        return Err(ManifestError::InvalidDest(entry.dest.clone()));
      }
      if !seen.insert(entry.dest.as_str()) {
        return Err(ManifestError::DuplicateDest(entry.dest.clone()));
      }
    }

    Ok(())
  }
}
