//! External container engine seam.
//!
//! The pipeline core never shells out directly; every build, push and run
//! goes through the [`Engine`] trait so the concrete tool is swappable in
//! tests. [`CliEngine`] is the production implementation: it invokes the
//! engine binary (`docker` unless `SLIPWAY_ENGINE` says otherwise) as a
//! blocking subprocess with captured output.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_ENGINE, ENGINE_ENV};
use crate::tag::Tag;

/// Captured result of one engine subprocess call.
#[derive(Debug, Clone)]
pub struct CommandOutput {
  /// Exit code, `None` when the process was terminated by a signal.
  pub exit_code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }

  /// Stdout and stderr concatenated, for error reporting.
  pub fn combined(&self) -> String {
    let mut out = self.stdout.clone();
    if !self.stderr.is_empty() {
      if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
      }
      out.push_str(&self.stderr);
    }
    out
  }
}

/// Outcome of running the image as an ephemeral container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// The container terminated on its own with this exit code.
  /// Termination by signal is reported as exit code 1.
  Exited(i32),

  /// The container was still running when the timeout expired. It has been
  /// forcibly terminated and removed.
  TimedOut,
}

/// Abstract capability the pipeline depends on: build an image from a
/// context, push it, run it once.
#[async_trait]
pub trait Engine: Send + Sync {
  /// Build the image for `tag` from the contents of `context`.
  ///
  /// Blocks until the external build exits. A previously built artifact
  /// under the same tag is overwritten; tags are mutable pointers, not
  /// unique identities.
  async fn build(&self, context: &Path, tag: &Tag) -> io::Result<CommandOutput>;

  /// Push the artifact named by `tag` to its remote registry.
  async fn push(&self, tag: &Tag) -> io::Result<CommandOutput>;

  /// Run the artifact as an ephemeral container and wait for it to exit.
  ///
  /// The container is removed on every exit path; on timeout it is killed
  /// before removal.
  async fn run(&self, tag: &Tag, timeout: Duration) -> io::Result<RunOutcome>;
}

/// Engine implementation backed by a docker-compatible CLI.
pub struct CliEngine {
  program: String,
}

impl CliEngine {
  pub fn new(program: impl Into<String>) -> Self {
    CliEngine { program: program.into() }
  }

  /// Engine binary from `SLIPWAY_ENGINE`, falling back to `docker`.
  pub fn from_env() -> Self {
    let program = std::env::var(ENGINE_ENV).unwrap_or_else(|_| DEFAULT_ENGINE.to_string());
    CliEngine { program }
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  async fn capture(&self, args: &[&str]) -> io::Result<CommandOutput> {
    debug!(program = %self.program, ?args, "invoking engine");

    let output = Command::new(&self.program).args(args).output().await?;

    Ok(CommandOutput {
      exit_code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
  }

  /// Force-remove a container, ignoring failures: the container may have
  /// already been reaped, and cleanup must not mask the primary result.
  async fn remove_container(&self, name: &str) {
    match self.capture(&["rm", "-f", name]).await {
      Ok(output) if !output.success() => {
        debug!(container = name, code = ?output.exit_code, "container removal reported failure");
      }
      Ok(_) => {}
      Err(e) => warn!(container = name, error = %e, "failed to invoke container removal"),
    }
  }
}

#[async_trait]
impl Engine for CliEngine {
  async fn build(&self, context: &Path, tag: &Tag) -> io::Result<CommandOutput> {
    info!(tag = %tag, context = %context.display(), "building image");

    let tag_str = tag.to_string();
    let context_str = context.to_string_lossy().into_owned();
    let output = self.capture(&["build", "-t", tag_str.as_str(), context_str.as_str()]).await?;

    if output.success() {
      info!(tag = %tag, "image built");
    }
    Ok(output)
  }

  async fn push(&self, tag: &Tag) -> io::Result<CommandOutput> {
    info!(tag = %tag, "pushing image");

    let tag_str = tag.to_string();
    self.capture(&["push", tag_str.as_str()]).await
  }

  async fn run(&self, tag: &Tag, timeout: Duration) -> io::Result<RunOutcome> {
    // Name the container after the tag and our pid so concurrent
    // invocations on disjoint tags cannot collide.
    let container = format!("slipway-{}-{}", tag.name(), std::process::id());
    info!(tag = %tag, container = %container, ?timeout, "running image");

    let tag_str = tag.to_string();
    let mut child = Command::new(&self.program)
      .args(["run", "--name", container.as_str(), tag_str.as_str()])
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()?;

    let outcome = match tokio::time::timeout(timeout, child.wait()).await {
      Ok(status) => {
        let code = status?.code().unwrap_or(1);
        debug!(container = %container, code, "container exited");
        RunOutcome::Exited(code)
      }
      Err(_) => {
        warn!(container = %container, ?timeout, "container did not exit in time, killing");
        let _ = child.start_kill();
        let _ = child.wait().await;
        RunOutcome::TimedOut
      }
    };

    self.remove_container(&container).await;

    Ok(outcome)
  }
}
