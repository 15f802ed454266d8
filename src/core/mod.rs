// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout movecodec.
//!
//! This module provides the foundational types for the library:
//! - [`TrackError`] - Error handling for every pipeline stage
//! - [`PipelineConfig`] - Tunables shared by both transports
//! - [`ChunkFormat`] - Wire format identifier for encoded chunks

pub mod config;
pub mod error;

pub use config::{PipelineConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CHUNK_SIZE};
pub use error::{Result, TrackError};

/// Wire format of an encoded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkFormat {
    /// Compact positional binary layout
    Binary,
    /// GeoJSON-like JSON document
    Json,
}

/// Error returned when parsing a `ChunkFormat` from string fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseChunkFormatError {
    _private: (),
}

impl std::fmt::Display for ParseChunkFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid chunk format, expected 'binary' or 'json'")
    }
}

impl std::error::Error for ParseChunkFormatError {}

impl std::str::FromStr for ChunkFormat {
    type Err = ParseChunkFormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" | "bin" => Ok(ChunkFormat::Binary),
            "json" => Ok(ChunkFormat::Json),
            _ => Err(ParseChunkFormatError { _private: () }),
        }
    }
}

impl ChunkFormat {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkFormat::Binary => "binary",
            ChunkFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_format_parse() {
        assert_eq!("binary".parse::<ChunkFormat>().unwrap(), ChunkFormat::Binary);
        assert_eq!("JSON".parse::<ChunkFormat>().unwrap(), ChunkFormat::Json);
        assert!("msgpack".parse::<ChunkFormat>().is_err());
        assert_eq!(ChunkFormat::Json.as_str(), "json");
    }
}
