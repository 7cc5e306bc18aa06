pub mod check;
pub mod chunks;
pub mod demo;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use treetrace_core::model::TrackerMessage;

#[derive(Subcommand)]
pub enum Commands {
    /// Reconstruct chunks from a recorded JSONL stream
    Chunks(chunks::ChunksArgs),
    /// Validate that a recorded stream has balanced brackets
    Check(check::CheckArgs),
    /// Run a sample instrumented session and print its stream
    Demo,
}

/// Reads a recorded stream from a file, or stdin for `-`.
pub fn read_stream(path: &Path) -> Result<Vec<TrackerMessage>> {
    let data = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    let messages = treetrace_protocol::from_jsonl(&data).context("Failed to parse stream")?;
    tracing::debug!("parsed {} message(s)", messages.len());
    Ok(messages)
}
