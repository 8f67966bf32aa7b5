use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mediastation_formats::{BytecodeFile, ChunkReader, Datum, DatumType};
use serde::Serialize;

/// List every typed datum inside a compiled script chunk.
#[derive(Parser)]
struct Args {
    /// Path to the compiled chunk
    path: PathBuf,

    /// Emit JSON instead of the columnar listing
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Entry {
    offset: usize,
    kind: DatumType,
    datum: Datum,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let file = BytecodeFile::open(&args.path)?;
    let mut reader = ChunkReader::new(file.body());
    let mut entries = Vec::new();
    while !reader.is_at_end() {
        let offset = reader.position();
        let (kind, datum) = reader
            .read_any()
            .with_context(|| format!("decoding datum at offset {offset}"))?;
        entries.push(Entry {
            offset,
            kind,
            datum,
        });
    }

    if args.json {
        let json = serde_json::to_string_pretty(&entries).context("serializing datum listing")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{} datums in {} ({} bytes)",
        entries.len(),
        file.path().display(),
        file.body().len()
    );
    for entry in &entries {
        let rendered = match &entry.datum {
            Datum::Unsigned(value) => format!("{value} (0x{value:X})"),
            Datum::Signed(value) => value.to_string(),
            Datum::Double(value) => format!("{value:.4}"),
            Datum::String(value) => format!("{value:?}"),
        };
        println!(
            "{offset:>8}  {kind:<10}  {rendered}",
            offset = entry.offset,
            kind = format!("{:?}", entry.kind),
        );
    }
    Ok(())
}
