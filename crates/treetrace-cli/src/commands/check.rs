use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::read_stream;

#[derive(Args)]
pub struct CheckArgs {
    /// Recorded JSONL stream, or `-` for stdin
    pub file: PathBuf,
}

pub fn run(args: &CheckArgs) -> Result<()> {
    let messages = read_stream(&args.file)?;
    let chunks = treetrace_protocol::chunks(&messages)?;
    let records = messages.iter().filter(|m| m.record().is_some()).count();
    println!(
        "stream is balanced: {} chunk(s), {} record(s)",
        chunks.len(),
        records
    );
    Ok(())
}
