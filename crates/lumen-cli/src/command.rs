//! Subcommand execution.

use std::path::Path;

use anyhow::Context;
use lumen_asset::{AssetStore, ImageRef, ImageUpload};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_COMMAND;
use crate::config::Command;

/// Runs `command` against `store`, printing its result as JSON.
pub async fn execute(
    store: &AssetStore,
    command: Command,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Command::Ingest {
            path,
            filename,
            content_type,
        } => {
            let upload = open_upload(&path, filename, content_type).await?;
            let ingested = store
                .ingest_with_cancel(upload, cancel)
                .await
                .with_context(|| format!("failed to ingest {}", path.display()))?;
            print_json(&ingested)
        }
        Command::Resolve { reference } => {
            let asset = store
                .resolve_with_cancel(&reference, cancel)
                .await
                .with_context(|| format!("failed to resolve {reference}"))?;
            print_json(&asset)
        }
        Command::Src { reference, size } => {
            let decoded = ImageRef::decode(&reference)?;
            let asset = store
                .resolve_with_cancel(&reference, cancel)
                .await
                .with_context(|| format!("failed to resolve {reference}"))?;
            let descriptor = asset.variant(size.unwrap_or(decoded.size()));
            println!("{}", store.source_url(descriptor));
            Ok(())
        }
        Command::Verify => {
            store
                .client()
                .verify_reachable()
                .await
                .with_context(|| format!("bucket {} is not reachable", store.config().bucket))?;
            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                bucket = %store.config().bucket,
                "bucket reachable"
            );
            Ok(())
        }
    }
}

/// Opens `path` as a streamed upload.
async fn open_upload(
    path: &Path,
    filename: Option<String>,
    content_type: Option<String>,
) -> anyhow::Result<ImageUpload> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;

    let filename = match filename {
        Some(filename) => filename,
        None => path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .with_context(|| format!("{} has no usable file name", path.display()))?,
    };

    let upload = ImageUpload::new(filename, ReaderStream::new(file));
    Ok(match content_type {
        Some(content_type) => upload.with_content_type(content_type),
        None => upload,
    })
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}
