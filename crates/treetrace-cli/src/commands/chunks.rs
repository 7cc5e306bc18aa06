use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::read_stream;

#[derive(Args)]
pub struct ChunksArgs {
    /// Recorded JSONL stream, or `-` for stdin
    pub file: PathBuf,
}

pub fn run(args: &ChunksArgs) -> Result<()> {
    let messages = read_stream(&args.file)?;
    let chunks = treetrace_protocol::chunks(&messages)?;

    for (index, chunk) in chunks.iter().enumerate() {
        let loc = chunk[0].loc().cloned().unwrap_or_default();
        let records: Vec<_> = chunk.iter().filter_map(|m| m.record()).collect();
        println!(
            "chunk {}  {}  {} record(s)",
            index + 1,
            loc,
            records.len()
        );
        for record in records {
            match &record.merge {
                Some(merge) => println!(
                    "    {}  {}  merge={}",
                    record.track_id, record.action_type, merge
                ),
                None => println!("    {}  {}", record.track_id, record.action_type),
            }
        }
    }
    println!("{} chunk(s)", chunks.len());
    Ok(())
}
