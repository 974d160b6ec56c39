//! Pipeline orchestration: dependency-ordered target execution.
//!
//! A pipeline invocation selects one terminal target and executes its
//! prerequisite chain front to back:
//!
//! 1. Prepare: stage the build context
//! 2. Build: produce the image for the tag
//! 3. Publish or Verify: push the image, or smoke-test it
//!
//! Targets run strictly sequentially. A prerequisite is skipped only when
//! it already succeeded in this invocation; a fresh invocation always
//! re-stages and rebuilds. The first failure aborts the remainder.

use std::io;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::engine::{Engine, RunOutcome};
use crate::stage::{self, StageError, StagingEntry};
use crate::tag::Tag;
use crate::workspace::Workspace;

/// A named pipeline stage with at most one direct prerequisite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  Prepare,
  Build,
  Publish,
  Verify,
}

impl Target {
  /// Direct prerequisite of this target. The chain is fixed; there is no
  /// general dependency graph.
  pub fn prerequisite(self) -> Option<Target> {
    match self {
      Target::Prepare => None,
      Target::Build => Some(Target::Prepare),
      Target::Publish | Target::Verify => Some(Target::Build),
    }
  }

  /// The full chain ending at this target, prerequisites first.
  pub fn chain(self) -> Vec<Target> {
    let mut chain = vec![self];
    let mut current = self;
    while let Some(prereq) = current.prerequisite() {
      chain.push(prereq);
      current = prereq;
    }
    chain.reverse();
    chain
  }

  pub fn name(self) -> &'static str {
    match self {
      Target::Prepare => "prepare",
      Target::Build => "build",
      Target::Publish => "publish",
      Target::Verify => "verify",
    }
  }

  fn index(self) -> usize {
    match self {
      Target::Prepare => 0,
      Target::Build => 1,
      Target::Publish => 2,
      Target::Verify => 3,
    }
  }
}

impl std::fmt::Display for Target {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Completion status of a target, scoped to one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
  #[default]
  NotRun,
  Succeeded,
  Failed,
}

/// Errors that can abort a pipeline invocation.
///
/// Every variant is fatal: the remainder of the chain is not executed and
/// nothing is retried. Retries, if desired, are the caller's business via
/// re-invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// Staging failed (missing source, permission denied, escape attempt).
  #[error("staging failed: {0}")]
  Stage(#[from] StageError),

  /// The external build exited non-zero.
  #[error("build failed with exit code {exit_code:?}")]
  BuildFailed { exit_code: Option<i32>, output: String },

  /// The external push exited non-zero.
  #[error("publish failed with exit code {exit_code:?}")]
  PublishFailed { exit_code: Option<i32> },

  /// The verified instance exited non-zero.
  #[error("verification failed with exit code {exit_code}")]
  VerifyFailed { exit_code: i32 },

  /// The verified instance did not terminate within the timeout.
  #[error("verification timed out after {limit:?}")]
  VerifyTimeout { limit: Duration },

  /// The engine binary could not be invoked at all.
  #[error("engine invocation failed: {0}")]
  Io(#[from] io::Error),
}

/// Per-invocation pipeline inputs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  /// Tag the artifact is labeled with, constant across all stages.
  pub tag: Tag,

  /// Staging set, sources already resolved to usable paths.
  pub staging: Vec<StagingEntry>,

  /// Workspace owning the build context.
  pub workspace: Workspace,

  /// Maximum time the verified instance may run.
  pub verify_timeout: Duration,
}

/// Summary of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub tag: Tag,
  /// Targets executed in this call, in order.
  pub executed: Vec<Target>,
  /// Targets skipped because they already succeeded in this invocation.
  pub skipped: Vec<Target>,
  /// Exit code of the verified instance when Verify ran.
  pub verify_exit_code: Option<i32>,
  pub duration_ms: u64,
}

/// One pipeline invocation: target statuses plus everything the stages need.
pub struct Pipeline<'e> {
  engine: &'e dyn Engine,
  options: PipelineOptions,
  status: [TargetStatus; 4],
}

impl<'e> Pipeline<'e> {
  pub fn new(engine: &'e dyn Engine, options: PipelineOptions) -> Self {
    Pipeline {
      engine,
      options,
      status: [TargetStatus::NotRun; 4],
    }
  }

  pub fn status(&self, target: Target) -> TargetStatus {
    self.status[target.index()]
  }

  /// Execute `target` and its prerequisite chain, fail-fast.
  ///
  /// Prerequisites that already succeeded in this invocation are skipped;
  /// everything else runs in chain order. On failure the failing target is
  /// marked [`TargetStatus::Failed`] and the error is returned immediately.
  pub async fn run(&mut self, target: Target) -> Result<RunReport, PipelineError> {
    let start = Instant::now();
    info!(target = %target, tag = %self.options.tag, "running pipeline");

    let mut executed = Vec::new();
    let mut skipped = Vec::new();
    let mut verify_exit_code = None;

    for step in target.chain() {
      if self.status(step) == TargetStatus::Succeeded {
        info!(target = %step, "already satisfied, skipping");
        skipped.push(step);
        continue;
      }

      match self.execute(step).await {
        Ok(exit_code) => {
          self.status[step.index()] = TargetStatus::Succeeded;
          executed.push(step);
          if step == Target::Verify {
            verify_exit_code = exit_code;
          }
        }
        Err(e) => {
          self.status[step.index()] = TargetStatus::Failed;
          error!(target = %step, error = %e, "pipeline aborted");
          return Err(e);
        }
      }
    }

    let report = RunReport {
      tag: self.options.tag.clone(),
      executed,
      skipped,
      verify_exit_code,
      duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
      executed = report.executed.len(),
      skipped = report.skipped.len(),
      "pipeline complete"
    );

    Ok(report)
  }

  async fn execute(&mut self, target: Target) -> Result<Option<i32>, PipelineError> {
    let tag = &self.options.tag;
    let context = self.options.workspace.context_dir(tag);

    match target {
      Target::Prepare => {
        stage::prepare(&self.options.staging, &context, self.options.workspace.root())?;
        Ok(None)
      }

      Target::Build => {
        let output = self.engine.build(&context, tag).await?;
        if !output.success() {
          return Err(PipelineError::BuildFailed {
            exit_code: output.exit_code,
            output: output.combined(),
          });
        }
        Ok(None)
      }

      Target::Publish => {
        let output = self.engine.push(tag).await?;
        if !output.success() {
          return Err(PipelineError::PublishFailed {
            exit_code: output.exit_code,
          });
        }
        Ok(None)
      }

      Target::Verify => {
        let limit = self.options.verify_timeout;
        match self.engine.run(tag, limit).await? {
          RunOutcome::Exited(0) => Ok(Some(0)),
          RunOutcome::Exited(exit_code) => Err(PipelineError::VerifyFailed { exit_code }),
          RunOutcome::TimedOut => Err(PipelineError::VerifyTimeout { limit }),
        }
      }
    }
  }
}
