// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer around the pipeline.
//!
//! This module holds the request shape and the narrow contracts with the
//! pipeline's collaborators: the upstream raw-table provider, the tabular
//! record decoder and the individual cache.

pub mod cache;
pub mod decoder;
pub mod request;
pub mod source;

// Re-exports
pub use cache::{CacheKey, IndividualCache, MemoryCache, NoopCache};
pub use decoder::{DecodeStats, RecordDecoder};
pub use request::{EventOptions, EventRequest, GeometryType};
pub use source::{EventSource, EventTable, FileEventSource, StaticEventSource};
