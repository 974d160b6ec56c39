//! Pipeline integration tests: prepare/build/publish/test end to end
//! against the scripted fake engine.

use std::time::Instant;

use predicates::prelude::*;

use super::common::{TAG, TestEnv};

// =============================================================================
// prepare
// =============================================================================

#[test]
fn prepare_stages_exact_contents() {
  let env = TestEnv::new();

  env
    .slipway_cmd()
    .arg("prepare")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build context staged"));

  assert_eq!(env.context_listing(), vec!["pkg", "setup.py"]);
  assert!(env.context_dir().join("pkg/module.py").exists());
  // Prepare alone never touches the engine.
  assert!(env.engine_calls().is_empty());
}

#[test]
fn prepare_restaging_removes_stale_files() {
  let env = TestEnv::new();

  env.slipway_cmd().arg("prepare").assert().success();
  assert_eq!(env.context_listing(), vec!["pkg", "setup.py"]);

  // Shrink the staging set and re-run: only the new set remains.
  env.write_manifest(r#"[{ "source": "setup.py", "dest": "setup.py" }]"#);
  env.slipway_cmd().arg("prepare").assert().success();

  assert_eq!(env.context_listing(), vec!["setup.py"]);
}

#[test]
fn prepare_fails_on_missing_source() {
  let env = TestEnv::new();
  env.write_manifest(r#"[{ "source": "no_such_dir", "dest": "pkg" }]"#);

  env
    .slipway_cmd()
    .arg("prepare")
    .assert()
    .failure()
    .stderr(predicate::str::contains("staging source not found"));
}

// =============================================================================
// build
// =============================================================================

#[test]
fn build_invokes_engine_with_tag_and_context() {
  let env = TestEnv::new();

  env
    .slipway_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("Built {}", TAG)));

  let calls = env.engine_calls();
  assert_eq!(calls.len(), 1);
  assert_eq!(
    calls[0],
    format!("build -t {} {}", TAG, env.context_dir().display())
  );
}

#[test]
fn build_twice_rebuilds_under_the_same_tag() {
  let env = TestEnv::new();

  env.slipway_cmd().arg("build").assert().success();

  // Change the context contents between invocations.
  std::fs::write(env.temp.path().join("setup.py"), "setup(version='2')\n").unwrap();
  env.slipway_cmd().arg("build").assert().success();

  // Two builds, same tag: overwrite semantics, never an error.
  let builds: Vec<_> = env.engine_calls().into_iter().filter(|c| c.starts_with("build")).collect();
  assert_eq!(builds.len(), 2);
  assert_eq!(
    std::fs::read_to_string(env.context_dir().join("setup.py")).unwrap(),
    "setup(version='2')\n"
  );
}

#[test]
fn build_failure_is_fatal_and_reported() {
  let env = TestEnv::new();
  env.install_engine(2, 0, 0, 0);

  env
    .slipway_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("build failed"));
}

#[test]
fn build_tag_override_wins_over_manifest() {
  let env = TestEnv::new();

  env
    .slipway_cmd()
    .args(["build", "--tag", "funkelab/lsd:v0.9"])
    .assert()
    .success();

  let calls = env.engine_calls();
  assert!(calls[0].contains("-t funkelab/lsd:v0.9"));
}

// =============================================================================
// publish
// =============================================================================

#[test]
fn publish_builds_first_then_pushes() {
  let env = TestEnv::new();

  env
    .slipway_cmd()
    .arg("publish")
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("Published {}", TAG)));

  let calls = env.engine_calls();
  assert_eq!(calls.len(), 2);
  assert!(calls[0].starts_with("build "));
  assert_eq!(calls[1], format!("push {}", TAG));
}

#[test]
fn publish_twice_is_idempotent() {
  let env = TestEnv::new();

  env.slipway_cmd().arg("publish").assert().success();
  env.slipway_cmd().arg("publish").assert().success();

  let pushes = env.engine_calls().into_iter().filter(|c| c.starts_with("push")).count();
  assert_eq!(pushes, 2);
}

#[test]
fn publish_failure_surfaces_exit_code() {
  let env = TestEnv::new();
  env.install_engine(0, 1, 0, 0);

  env
    .slipway_cmd()
    .arg("publish")
    .assert()
    .failure()
    .stderr(predicate::str::contains("publish failed"));
}

// =============================================================================
// test
// =============================================================================

#[test]
fn test_healthy_instance_exits_zero() {
  let env = TestEnv::new();

  env
    .slipway_cmd()
    .arg("test")
    .assert()
    .success()
    .stdout(predicate::str::contains("Verification passed"));

  let calls = env.engine_calls();
  assert!(calls[0].starts_with("build "));
  assert!(calls[1].starts_with("run --name slipway-lsd-"));
}

#[test]
fn test_mirrors_instance_exit_code() {
  let env = TestEnv::new();
  env.install_engine(0, 0, 7, 0);

  env
    .slipway_cmd()
    .arg("test")
    .assert()
    .code(7)
    .stderr(predicate::str::contains("verification failed with exit code 7"));
}

#[test]
fn test_timeout_kills_and_cleans_up() {
  let env = TestEnv::new();
  env.install_engine(0, 0, 0, 30);

  let start = Instant::now();
  env
    .slipway_cmd()
    .args(["test", "--timeout", "1s"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("timed out"));

  assert!(
    start.elapsed().as_secs() < 20,
    "timeout should fire long before the container's sleep"
  );

  // The ephemeral container was force-removed after the kill.
  let calls = env.engine_calls();
  assert!(calls.iter().any(|c| c.starts_with("rm -f slipway-lsd-")));
}

// =============================================================================
// json output
// =============================================================================

#[test]
fn build_json_output_reports_targets() {
  let env = TestEnv::new();

  let assert = env.slipway_cmd().args(["build", "-o", "json"]).assert().success();

  let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
  let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
  assert_eq!(report["tag"], TAG);
  assert_eq!(report["executed"], serde_json::json!(["prepare", "build"]));
}
