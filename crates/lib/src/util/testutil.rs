//! Test doubles for the engine seam.
//!
//! `RecordingEngine` substitutes the external container tool in pipeline
//! tests: it records every call in order and returns scripted results, so
//! tests can assert prerequisite execution and call counts without a real
//! engine on the machine.

use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{CommandOutput, Engine, RunOutcome};
use crate::tag::Tag;

/// Scripted results for a [`RecordingEngine`].
#[derive(Debug, Clone)]
pub struct Script {
  pub build_exit: i32,
  pub build_output: String,
  pub push_exit: i32,
  pub run_outcome: RunOutcome,
}

impl Default for Script {
  fn default() -> Self {
    Script {
      build_exit: 0,
      build_output: String::new(),
      push_exit: 0,
      run_outcome: RunOutcome::Exited(0),
    }
  }
}

/// Engine fake that records calls and replays a [`Script`].
#[derive(Debug, Default)]
pub struct RecordingEngine {
  script: Script,
  calls: Mutex<Vec<String>>,
}

impl RecordingEngine {
  /// An engine where every operation succeeds.
  pub fn ok() -> Self {
    RecordingEngine::default()
  }

  pub fn with_script(script: Script) -> Self {
    RecordingEngine {
      script,
      calls: Mutex::new(Vec::new()),
    }
  }

  /// The recorded calls, in invocation order, e.g.
  /// `["build funkelab/lsd:v0.8", "push funkelab/lsd:v0.8"]`.
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }
}

#[async_trait]
impl Engine for RecordingEngine {
  async fn build(&self, context: &Path, tag: &Tag) -> io::Result<CommandOutput> {
    self.record(format!("build {} {}", tag, context.display()));
    Ok(CommandOutput {
      exit_code: Some(self.script.build_exit),
      stdout: self.script.build_output.clone(),
      stderr: String::new(),
    })
  }

  async fn push(&self, tag: &Tag) -> io::Result<CommandOutput> {
    self.record(format!("push {}", tag));
    Ok(CommandOutput {
      exit_code: Some(self.script.push_exit),
      stdout: String::new(),
      stderr: String::new(),
    })
  }

  async fn run(&self, tag: &Tag, _timeout: Duration) -> io::Result<RunOutcome> {
    self.record(format!("run {}", tag));
    Ok(self.script.run_outcome)
  }
}
