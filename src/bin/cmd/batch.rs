// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Batch command - build the sorted collection and print it.

use std::io::{BufWriter, Write};

use clap::Args;

use crate::common::{RequestArgs, Result};
use movecodec::encoding::encode_chunk_json;

/// Build every chunk for a request, sorted by timestamp.
#[derive(Args, Clone, Debug)]
pub struct BatchCmd {
    #[command(flatten)]
    request: RequestArgs,

    /// Print one summary line per chunk instead of JSON
    #[arg(long)]
    summary: bool,

    /// Pretty-print JSON chunks
    #[arg(long, conflicts_with = "summary")]
    pretty: bool,
}

impl BatchCmd {
    pub fn run(self) -> Result<()> {
        let request = self.request.to_request()?;
        let pipeline = self.request.pipeline()?;
        let chunks = pipeline.get_events(&request)?;

        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        for chunk in chunks {
            if self.summary {
                writeln!(
                    out,
                    "{} #{}: {} segments, {:.3} km",
                    chunk.individual_local_identifier,
                    chunk.index,
                    chunk.count,
                    chunk.end_distance_km().unwrap_or(0.0)
                )?;
            } else {
                writeln!(out, "{}", encode_chunk_json(&chunk, self.pretty)?)?;
            }
        }
        out.flush()?;

        Ok(())
    }
}
