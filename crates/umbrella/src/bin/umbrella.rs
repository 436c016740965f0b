//! Umbrella webhook gateway.
//!
//! # Usage
//!
//! ```bash
//! umbrella --config umbrella.toml
//! umbrella --profile production --registry /etc/umbrella/registry.json
//! umbrella --check
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use umbrella::runtime::{UmbrellaRuntime, tracing::info};

/// Forward chat slash commands to serverless functions
#[derive(Parser, Debug)]
#[command(name = "umbrella")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to umbrella.toml in the current or user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. development or production
    #[arg(short, long)]
    profile: Option<String>,

    /// Command registry file, tried before any other registry source
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Load and validate everything, print a summary and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = UmbrellaRuntime::builder();
    if let Some(config) = &args.config {
        builder = builder.config_file(config);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    if let Some(registry) = &args.registry {
        builder = builder.registry_location(registry);
    }

    // Built before the async runtime: the HTTP clients are blocking.
    let runtime = builder.build().context("failed to start umbrella")?;

    if args.check {
        print!("{}", umbrella::check::summary(&runtime));
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;
    let result = rt.block_on(runtime.run());

    // The async runtime must go first so no blocking client is dropped on it.
    drop(rt);
    info!("Umbrella exited");
    drop(runtime);

    result.context("umbrella stopped with an error")
}
