//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory with project sources, a
/// manifest, an isolated workspace root, and a scripted fake engine.
pub struct TestEnv {
  pub temp: TempDir,
  pub manifest_path: PathBuf,
  engine_script: PathBuf,
  engine_log: PathBuf,
}

pub const TAG: &str = "funkelab/lsd:v0.8";

impl TestEnv {
  /// Create a project with a package directory and a `setup.py`, staged by
  /// the default manifest, plus a fake engine where everything succeeds.
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();

    std::fs::create_dir_all(temp.path().join("pkg")).unwrap();
    std::fs::write(temp.path().join("pkg/module.py"), "x = 1\n").unwrap();
    std::fs::write(temp.path().join("setup.py"), "setup()\n").unwrap();

    let manifest_path = temp.path().join("slipway.json");
    let env = TestEnv {
      engine_script: temp.path().join("engine.sh"),
      engine_log: temp.path().join("engine.log"),
      manifest_path,
      temp,
    };

    env.write_manifest(
      r#"[
        { "source": "pkg", "dest": "pkg" },
        { "source": "setup.py", "dest": "setup.py" }
      ]"#,
    );
    env.install_engine(0, 0, 0, 0);

    env
  }

  /// (Re)write the manifest with the given staging JSON array.
  pub fn write_manifest(&self, staging: &str) {
    let manifest = format!(r#"{{ "tag": "{}", "staging": {} }}"#, TAG, staging);
    std::fs::write(&self.manifest_path, manifest).unwrap();
  }

  /// (Re)write the fake engine script with scripted exit codes.
  pub fn install_engine(&self, build_exit: i32, push_exit: i32, run_exit: i32, run_sleep_secs: u32) {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
      "#!/bin/sh\n\
       echo \"$@\" >> \"{log}\"\n\
       case \"$1\" in\n\
       \x20 build) exit {build_exit} ;;\n\
       \x20 push) exit {push_exit} ;;\n\
       \x20 run) sleep {run_sleep_secs}; exit {run_exit} ;;\n\
       \x20 *) exit 0 ;;\n\
       esac\n",
      log = self.engine_log.display(),
    );
    std::fs::write(&self.engine_script, script).unwrap();
    std::fs::set_permissions(&self.engine_script, std::fs::Permissions::from_mode(0o755)).unwrap();
  }

  /// Workspace root (isolated per test).
  pub fn workspace_path(&self) -> PathBuf {
    self.temp.path().join("ws")
  }

  /// Build context directory for the default tag.
  pub fn context_dir(&self) -> PathBuf {
    self.workspace_path().join("contexts").join("funkelab-lsd-v0.8")
  }

  /// Sorted file names in the context directory.
  pub fn context_listing(&self) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(self.context_dir())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    names
  }

  /// The fake engine's recorded argv lines, in call order.
  pub fn engine_calls(&self) -> Vec<String> {
    std::fs::read_to_string(&self.engine_log)
      .unwrap_or_default()
      .lines()
      .map(String::from)
      .collect()
  }

  /// Get a pre-configured Command for the slipway binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `SLIPWAY_WORKSPACE`: isolated workspace root
  /// - `SLIPWAY_ENGINE`: the scripted fake engine
  pub fn slipway_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("slipway");
    cmd.current_dir(self.temp.path());
    cmd.env("SLIPWAY_WORKSPACE", self.workspace_path());
    cmd.env("SLIPWAY_ENGINE", &self.engine_script);
    cmd
  }
}
