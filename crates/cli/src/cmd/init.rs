//! Implementation of the `slipway init` command.
//!
//! Writes a starter manifest so a new project has something to edit
//! instead of a blank page.

use std::path::Path;

use anyhow::{Context, Result, bail};

use slipway_lib::consts::MANIFEST_FILENAME;

use crate::output::{print_info, print_success};

const TEMPLATE: &str = r#"{
  "tag": "example/app:0.1.0",
  "staging": [
    { "source": "src", "dest": "src" },
    { "source": "Dockerfile", "dest": "Dockerfile" }
  ]
}
"#;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if a manifest already exists at the target path or the
/// directory cannot be created.
pub fn cmd_init(dir: &Path) -> Result<()> {
  let manifest_path = dir.join(MANIFEST_FILENAME);

  if manifest_path.exists() {
    bail!("manifest already exists: {}", manifest_path.display());
  }

  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
  std::fs::write(&manifest_path, TEMPLATE)
    .with_context(|| format!("Failed to write manifest {}", manifest_path.display()))?;

  print_success("Initialized slipway manifest");
  print_info(&format!("Edit {} and run `slipway build`", manifest_path.display()));

  Ok(())
}
