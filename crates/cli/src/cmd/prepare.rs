//! Implementation of the `slipway prepare` command.
//!
//! Stages the build context only: resets the per-tag context directory and
//! copies the manifest's staging set into it.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use slipway_lib::pipeline::{Pipeline, Target};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

use super::{invocation, print_pipeline_error};

/// Execute the prepare command.
///
/// On success the context directory contains exactly the staged entries;
/// anything a previous run left there is gone.
pub fn cmd_prepare(manifest_path: &Path, output: OutputFormat) -> Result<()> {
  let inv = invocation(manifest_path, None, Duration::from_secs(30), "prepare")?;
  let context_dir = inv.options.workspace.context_dir(&inv.options.tag);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut pipeline = Pipeline::new(&inv.engine, inv.options.clone());

  match rt.block_on(pipeline.run(Target::Prepare)) {
    Ok(report) => {
      if output.is_json() {
        return print_json(&report);
      }
      print_success("Build context staged");
      print_stat("Tag", &report.tag.to_string());
      print_stat("Context", &context_dir.display().to_string());
      Ok(())
    }
    Err(e) => {
      print_pipeline_error(&e);
      std::process::exit(1);
    }
  }
}
