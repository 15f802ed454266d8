// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Stream command - run the streaming transport into a frame file.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::Args;

use crate::common::{format_bytes, format_duration, RequestArgs, Result, Spinner};
use movecodec::encoding::{encoder_for, FrameWriter};
use movecodec::{CancellationToken, ChunkFormat};

/// Stream encoded chunks for a request.
#[derive(Args, Clone, Debug)]
pub struct StreamCmd {
    #[command(flatten)]
    request: RequestArgs,

    /// Output frame file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Chunk encoding (binary or json)
    #[arg(long, default_value = "binary")]
    format: ChunkFormat,
}

impl StreamCmd {
    pub fn run(self) -> Result<()> {
        let request = self.request.to_request()?;
        let pipeline = self
            .request
            .pipeline()?
            .with_encoder(Arc::from(encoder_for(self.format)));

        let file = File::create(&self.output)
            .with_context(|| format!("failed to create {}", self.output.display()))?;
        let mut writer = FrameWriter::new(BufWriter::new(file));

        let spinner = Spinner::new("stream");
        let started = Instant::now();
        let mut bytes = 0u64;

        let mut stream = pipeline.stream_events(request, CancellationToken::new());
        for item in stream.by_ref() {
            let chunk = item?;
            bytes += chunk.len() as u64;
            writer.write_frame(&chunk)?;
            spinner.set_message(format!("{} chunks", writer.frame_count()));
        }
        let stats = stream.finish()?;
        let frames = writer.frame_count();
        writer.finish()?;

        spinner.finish_with_message(format!("{frames} chunks"));
        println!("=== {} ===", self.output.display());
        println!("Format: {}", self.format.as_str());
        println!("Rows: {} accepted, {} dropped", stats.rows_accepted, stats.rows_dropped);
        println!("Individuals: {}", stats.individuals_completed);
        println!("Chunks: {}", stats.chunks_emitted);
        println!("Segments: {}", stats.segments_emitted);
        println!("Encoded: {}", format_bytes(bytes));
        println!(
            "Elapsed: {}",
            format_duration(started.elapsed().as_millis() as u64)
        );

        Ok(())
    }
}
