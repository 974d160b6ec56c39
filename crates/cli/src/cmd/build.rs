//! Implementation of the `slipway build` command.
//!
//! Stages the build context, then invokes the external engine to produce
//! the image for the tag. An existing image under the same tag is
//! overwritten.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use slipway_lib::pipeline::{Pipeline, Target};

use crate::output::{OutputFormat, print_json, print_success};

use super::{invocation, print_pipeline_error, print_report_stats};

/// Execute the build command.
pub fn cmd_build(manifest_path: &Path, tag: Option<&str>, output: OutputFormat) -> Result<()> {
  let inv = invocation(manifest_path, tag, Duration::from_secs(30), "build")?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut pipeline = Pipeline::new(&inv.engine, inv.options.clone());

  match rt.block_on(pipeline.run(Target::Build)) {
    Ok(report) => {
      if output.is_json() {
        return print_json(&report);
      }
      print_success(&format!("Built {}", report.tag));
      print_report_stats(&report);
      Ok(())
    }
    Err(e) => {
      print_pipeline_error(&e);
      std::process::exit(1);
    }
  }
}
