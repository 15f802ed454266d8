// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show frame files and raw event tables.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Subcommand;

use crate::common::{format_duration, Result};
use movecodec::encoding::{decode_with, FrameReader};
use movecodec::io::RecordDecoder;
use movecodec::pipeline::{group_samples, GroupFilter, GroupOrder};
use movecodec::types::format_timestamp;
use movecodec::ChunkFormat;

/// Inspect files produced or consumed by the pipeline.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// Decode a frame file written by `stream`
    Frames {
        /// Input frame file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Chunk encoding (detected from the first byte if omitted)
        #[arg(long)]
        format: Option<ChunkFormat>,

        /// Print every segment label
        #[arg(long)]
        segments: bool,
    },

    /// Summarize a raw event table per individual
    Table {
        /// Input CSV table
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Frames {
                input,
                format,
                segments,
            } => cmd_frames(input, format, segments),
            InspectCmd::Table { input } => cmd_table(input),
        }
    }
}

/// JSON chunks start with an object; binary chunks with their field count.
fn detect_format(payload: &[u8]) -> ChunkFormat {
    match payload.first() {
        Some(b'{') => ChunkFormat::Json,
        _ => ChunkFormat::Binary,
    }
}

/// Cmd: Decode frames
fn cmd_frames(input: PathBuf, format: Option<ChunkFormat>, show_segments: bool) -> Result<()> {
    let file =
        File::open(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let reader = FrameReader::new(BufReader::new(file));

    println!("=== {} ===", input.display());

    let mut chunks = 0usize;
    let mut total_segments = 0usize;
    for frame in reader {
        let payload = frame?;
        let format = format.unwrap_or_else(|| detect_format(&payload));
        let chunk = decode_with(format, &payload)?;

        println!(
            "[{}] {} #{} | {} segments | {} bytes",
            chunks, chunk.individual_local_identifier, chunk.index, chunk.count, payload.len()
        );
        if show_segments {
            for segment in &chunk.segments {
                println!(
                    "    {} [{}]",
                    segment.content,
                    format_duration(segment.duration_ms().max(0) as u64)
                );
            }
        }

        chunks += 1;
        total_segments += chunk.segments.len();
    }

    println!();
    println!("Chunks: {chunks}");
    println!("Segments: {total_segments}");
    Ok(())
}

/// Cmd: Summarize a table
fn cmd_table(input: PathBuf) -> Result<()> {
    let file =
        File::open(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let mut decoder = RecordDecoder::new(BufReader::new(file))?;
    let groups = group_samples(decoder.by_ref(), GroupFilter::all(), GroupOrder::Timestamp);
    let stats = decoder.stats();

    println!("=== {} ===", input.display());
    println!("Rows: {} accepted, {} dropped", stats.rows_accepted, stats.rows_dropped);
    println!("Individuals: {}", groups.len());
    println!();

    for group in &groups {
        let first = group.samples.first().map(|s| s.timestamp);
        let last = group.samples.last().map(|s| s.timestamp);
        match (first, last) {
            (Some(first), Some(last)) => println!(
                "  {} | {} samples | {} .. {} ({})",
                group.individual_local_identifier,
                group.len(),
                format_timestamp(first),
                format_timestamp(last),
                format_duration(last.saturating_sub(first).max(0) as u64)
            ),
            _ => println!("  {} | 0 samples", group.individual_local_identifier),
        }
    }

    Ok(())
}
