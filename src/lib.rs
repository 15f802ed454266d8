// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Movecodec
//!
//! Streaming and encoding pipeline for animal-tracking location records.
//!
//! A raw event table (one row per GPS fix) is decoded into location samples,
//! grouped per individual, turned into consecutive-pair movement segments with
//! great-circle distances, batched into chunks of at most 1000 segments and
//! encoded for the wire.
//!
//! ## Architecture
//!
//! - `core/` - Errors, configuration and the wire format identifier
//! - `types/` - Samples, segments, chunks and feature collections
//! - `io/` - Requests, upstream event sources, the CSV decoder and the cache
//! - `pipeline/` - Grouping, segment building, chunking and both transports
//! - `encoding/` - Binary and JSON chunk encoders plus file framing
//!
//! ## Example: Streaming
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use movecodec::io::{EventRequest, FileEventSource, MemoryCache};
//! use movecodec::{CancellationToken, EventPipeline};
//!
//! let pipeline = EventPipeline::new(
//!     Arc::new(FileEventSource::new("data/")),
//!     Arc::new(MemoryCache::new()),
//! );
//! let request = EventRequest::new(2911040, ["A1", "A2"]);
//! for chunk in pipeline.stream_events(request, CancellationToken::new()) {
//!     let bytes = chunk?;
//!     println!("chunk of {} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Batch
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use movecodec::io::{EventRequest, FileEventSource};
//! use movecodec::EventPipeline;
//!
//! let pipeline = EventPipeline::without_cache(Arc::new(FileEventSource::new("data/")));
//! for chunk in pipeline.get_events(&EventRequest::new(2911040, ["A1"]))? {
//!     println!("{} #{}: {} segments", chunk.individual_local_identifier, chunk.index, chunk.count);
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{ChunkFormat, PipelineConfig, Result, TrackError};

// Data model
pub mod types;

pub use types::{Chunk, FeatureCollection, IndividualGroup, LocationSample, Point, Segment};

// Requests, sources, decoder, cache
pub mod io;

// Chunk encoders and framing
pub mod encoding;

pub use encoding::ChunkEncoder;

// Grouping, segments, chunking and transports
pub mod pipeline;

pub use pipeline::{CancellationToken, ChunkStream, EventPipeline, EventStream, StreamStats};
