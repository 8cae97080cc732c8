#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod shutdown;

use std::process;

use anyhow::Context;
use lumen_asset::AssetStore;
use lumen_object::providers::{Client, S3Provider};

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "lumen_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "lumen_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "lumen_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "lumen_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let credentials = cli.storage.credentials(&cli.asset.bucket);
    let provider = S3Provider::connect(&credentials)
        .await
        .context("failed to connect to object storage")?;
    let store = AssetStore::new(provider.into_client(), cli.asset)
        .context("failed to create asset store")?;

    let cancel = shutdown::cancel_on_signal();
    command::execute(&store, cli.command, &cancel).await
}
