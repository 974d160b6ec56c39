//! slipway - release pipeline runner
//!
//! Stages a build context, builds a container image under a versioned tag,
//! and optionally pushes the image or smoke-tests it in an ephemeral
//! container.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// slipway - stage, build, publish and smoke-test release images
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the pipeline manifest
  #[arg(short, long, global = true, default_value = "slipway.json")]
  manifest: PathBuf,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Stage the build context only
  Prepare {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Stage the build context and build the image
  Build {
    /// Tag to build under, overriding the manifest (namespace/name:version)
    #[arg(long)]
    tag: Option<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Build the image (if not already built in this invocation) and push it
  Publish {
    /// Tag to publish, overriding the manifest (namespace/name:version)
    #[arg(long)]
    tag: Option<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Build the image and run it once as a smoke test
  Test {
    /// Tag to test, overriding the manifest (namespace/name:version)
    #[arg(long)]
    tag: Option<String>,

    /// Maximum time the container may run (e.g. "5s", "2m")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    timeout: Duration,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Write a starter manifest
  Init {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    path: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("slipway=debug,slipway_lib=debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Prepare { output } => cmd::cmd_prepare(&cli.manifest, output),
    Commands::Build { tag, output } => cmd::cmd_build(&cli.manifest, tag.as_deref(), output),
    Commands::Publish { tag, output } => cmd::cmd_publish(&cli.manifest, tag.as_deref(), output),
    Commands::Test { tag, timeout, output } => cmd::cmd_test(&cli.manifest, tag.as_deref(), timeout, output),
    Commands::Init { path } => cmd::cmd_init(&path),
  }
}
