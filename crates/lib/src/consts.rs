//! Crate-wide constants.

/// Application name, used for default paths and lock metadata.
pub const APP_NAME: &str = "slipway";

/// Default manifest filename looked up in the current directory.
pub const MANIFEST_FILENAME: &str = "slipway.json";

/// Directory under the workspace root that holds per-tag build contexts.
pub const CONTEXTS_DIRNAME: &str = "contexts";

/// Default engine binary invoked for build/push/run.
pub const DEFAULT_ENGINE: &str = "docker";

/// Environment variable overriding the workspace root.
pub const WORKSPACE_ENV: &str = "SLIPWAY_WORKSPACE";

/// Environment variable overriding the engine binary.
pub const ENGINE_ENV: &str = "SLIPWAY_ENGINE";
