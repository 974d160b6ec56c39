mod build;
mod init;
mod prepare;
mod publish;

pub use build::cmd_build;
pub use init::cmd_init;
pub use prepare::cmd_prepare;
pub use publish::cmd_publish;
pub use test::cmd_test;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use slipway_lib::engine::CliEngine;
use slipway_lib::lock::WorkspaceLock;
use slipway_lib::manifest::PipelineManifest;
use slipway_lib::pipeline::{PipelineError, PipelineOptions, RunReport};
use slipway_lib::tag::Tag;
use slipway_lib::workspace::Workspace;

use crate::output::{format_duration, print_error, print_stat};

/// Everything one pipeline invocation needs, with the workspace lock held
/// for as long as this value lives.
pub(crate) struct Invocation {
  pub engine: CliEngine,
  pub options: PipelineOptions,
  _lock: WorkspaceLock,
}

/// Load the manifest, resolve the workspace and take the exclusive lock.
pub(crate) fn invocation(
  manifest_path: &Path,
  tag_override: Option<&str>,
  verify_timeout: Duration,
  command: &str,
) -> Result<Invocation> {
  let manifest = PipelineManifest::load(manifest_path)
    .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

  let tag = match tag_override {
    Some(raw) => raw.parse::<Tag>().context("Invalid --tag value")?,
    None => manifest.tag.clone(),
  };

  let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
  let workspace = Workspace::resolve(manifest_path, manifest.workspace.as_deref());
  let staging = manifest.resolved_staging(base);

  debug!(tag = %tag, workspace = %workspace.root().display(), "invocation resolved");

  let lock = WorkspaceLock::acquire(&workspace, command, &tag.to_string())?;

  Ok(Invocation {
    engine: CliEngine::from_env(),
    options: PipelineOptions {
      tag,
      staging,
      workspace,
      verify_timeout,
    },
    _lock: lock,
  })
}

/// Print the shared per-run stat lines of a text summary.
pub(crate) fn print_report_stats(report: &RunReport) {
  print_stat("Tag", &report.tag.to_string());
  print_stat(
    "Targets run",
    &report
      .executed
      .iter()
      .map(|t| t.name())
      .collect::<Vec<_>>()
      .join(", "),
  );
  if !report.skipped.is_empty() {
    print_stat(
      "Skipped (fresh)",
      &report.skipped.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "),
    );
  }
  print_stat("Duration", &format_duration(Duration::from_millis(report.duration_ms)));
}

/// Print a pipeline failure, including captured build output when present.
pub(crate) fn print_pipeline_error(err: &PipelineError) {
  print_error(&err.to_string());

  if let PipelineError::BuildFailed { output, .. } = err
    && !output.is_empty()
  {
    eprintln!();
    eprintln!("{}", output.trim_end());
  }
}
