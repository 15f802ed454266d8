// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunk encoding implementations.
//!
//! One internal [`Chunk`] model, two independent pure encoders:
//! - [`binary`] - Compact positional binary layout (the streaming wire format)
//! - [`json`] - GeoJSON-flavoured documents
//! - [`frame`] - Length-prefixed framing for persisting encoded chunk sequences

pub mod binary;
pub mod frame;
pub mod json;

use crate::core::{ChunkFormat, Result};
use crate::types::Chunk;

pub use binary::{decode_chunk, encode_chunk, BinaryChunkEncoder};
pub use frame::{FrameReader, FrameWriter};
pub use json::{decode_chunk_json, encode_chunk_json, JsonChunkEncoder};

/// Serializes sealed chunks for a transport.
///
/// Encoding is pure and synchronous. A failure is fatal for the request that
/// produced the chunk.
pub trait ChunkEncoder: Send + Sync {
    /// Encode one chunk.
    fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>>;

    /// Wire format this encoder produces.
    fn format(&self) -> ChunkFormat;
}

/// Create the encoder for a wire format.
pub fn encoder_for(format: ChunkFormat) -> Box<dyn ChunkEncoder> {
    match format {
        ChunkFormat::Binary => Box::new(BinaryChunkEncoder::new()),
        ChunkFormat::Json => Box::new(JsonChunkEncoder::new()),
    }
}

/// Decode a chunk in the given wire format.
pub fn decode_with(format: ChunkFormat, data: &[u8]) -> Result<Chunk> {
    match format {
        ChunkFormat::Binary => decode_chunk(data),
        ChunkFormat::Json => decode_chunk_json(data),
    }
}
