//! Implementation of the `slipway publish` command.
//!
//! Runs build's prerequisites, then pushes the image to its registry.
//! Publishing the same unchanged artifact again is safe; remote state
//! converges to the same content.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use slipway_lib::pipeline::{Pipeline, Target};

use crate::output::{OutputFormat, print_json, print_success};

use super::{invocation, print_pipeline_error, print_report_stats};

/// Execute the publish command.
pub fn cmd_publish(manifest_path: &Path, tag: Option<&str>, output: OutputFormat) -> Result<()> {
  let inv = invocation(manifest_path, tag, Duration::from_secs(30), "publish")?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut pipeline = Pipeline::new(&inv.engine, inv.options.clone());

  match rt.block_on(pipeline.run(Target::Publish)) {
    Ok(report) => {
      if output.is_json() {
        return print_json(&report);
      }
      print_success(&format!("Published {}", report.tag));
      print_report_stats(&report);
      Ok(())
    }
    Err(e) => {
      print_pipeline_error(&e);
      std::process::exit(1);
    }
  }
}
