// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Event pipeline: segment building, chunking and the two transports.
//!
//! # Architecture
//!
//! - [`grouper`] - Partition samples by individual
//! - [`segments`] - Consecutive-pair segments with haversine distances
//! - [`chunker`] - Chunk state machine with the trailing-chunk rule
//! - [`stream`] - Producer thread + bounded channel transport
//! - [`batch`] - Materialize, sort, then stream transport
//! - [`EventPipeline`] - Facade tying a source, a cache and an encoder together

pub mod batch;
pub mod chunker;
pub mod grouper;
pub mod segments;
pub mod stream;

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::core::{PipelineConfig, Result};
use crate::encoding::{BinaryChunkEncoder, ChunkEncoder};
use crate::io::{EventRequest, EventSource, IndividualCache, NoopCache};

pub use batch::ChunkStream;
pub use chunker::{chunk_individual, ChunkEvent, ChunkPlanner, ChunkState};
pub use grouper::{group_samples, GroupFilter, GroupOrder, IndividualGrouper};
pub use segments::{haversine_km, segment_label, SegmentBuilder, EARTH_RADIUS_KM};
pub use stream::{CancellationToken, EventStream, StreamStats};

use stream::Producer;

/// Entry point for both transports.
///
/// Holds the collaborators shared by every request. Requests share no other
/// state, so one pipeline can serve many requests concurrently.
#[derive(Clone)]
pub struct EventPipeline {
    source: Arc<dyn EventSource>,
    cache: Arc<dyn IndividualCache>,
    encoder: Arc<dyn ChunkEncoder>,
    config: PipelineConfig,
}

impl EventPipeline {
    /// Create a pipeline with the binary encoder and default configuration.
    pub fn new(source: Arc<dyn EventSource>, cache: Arc<dyn IndividualCache>) -> Self {
        Self {
            source,
            cache,
            encoder: Arc::new(BinaryChunkEncoder::new()),
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline that does not cache.
    pub fn without_cache(source: Arc<dyn EventSource>) -> Self {
        Self::new(source, Arc::new(NoopCache))
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the streaming encoder.
    pub fn with_encoder(mut self, encoder: Arc<dyn ChunkEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stream encoded chunks for a request.
    ///
    /// An empty identifier list yields an empty stream without contacting the
    /// source. Features are always line strings; `geometry_type` is ignored.
    pub fn stream_events(&self, request: EventRequest, token: CancellationToken) -> EventStream {
        if request.is_empty() {
            debug!(study_id = request.study_id, "empty request, nothing to stream");
            return EventStream::empty();
        }

        let producer = Producer {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
            encoder: Arc::clone(&self.encoder),
            request,
            chunk_size: self.config.chunk_size,
            token,
            request_id: Uuid::new_v4(),
        };
        producer.spawn(&self.config.thread_name, self.config.channel_capacity)
    }

    /// Build every chunk for a request, sorted per individual by timestamp,
    /// then stream them.
    ///
    /// # Errors
    ///
    /// Returns an error if the event table stops partway through. A failed
    /// fetch gives an empty stream.
    pub fn get_events(&self, request: &EventRequest) -> Result<ChunkStream> {
        if request.is_empty() {
            debug!(study_id = request.study_id, "empty request, nothing to build");
            return Ok(ChunkStream::empty());
        }
        let collection =
            batch::build_collection(self.source.as_ref(), request, self.config.chunk_size)?;
        Ok(ChunkStream::new(collection))
    }
}

impl std::fmt::Debug for EventPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPipeline")
            .field("format", &self.encoder.format())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{GeometryType, StaticEventSource};

    fn pipeline() -> EventPipeline {
        EventPipeline::without_cache(Arc::new(StaticEventSource::empty()))
    }

    #[test]
    fn test_empty_request_streams_nothing() {
        let request = EventRequest::new(1, Vec::<String>::new());
        let mut stream = pipeline().stream_events(request.clone(), CancellationToken::new());
        assert!(stream.next().is_none());
        assert_eq!(pipeline().get_events(&request).unwrap().count(), 0);
    }

    const TABLE: &str = "timestamp,location-long,location-lat,individual-local-identifier\n\
        1000,4.0,50.0,A\n\
        2000,4.1,50.1,A\n";

    #[test]
    fn test_point_geometry_still_builds_line_strings() {
        let pipeline = EventPipeline::without_cache(Arc::new(StaticEventSource::new(TABLE)));
        let mut request = EventRequest::new(1, ["A"]);
        request.geometry_type = Some(GeometryType::Point);

        let items = pipeline
            .stream_events(request.clone(), CancellationToken::new())
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(items.len(), 1);

        let chunks: Vec<_> = pipeline.get_events(&request).unwrap().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].count, 1);
    }

    #[test]
    fn test_inverted_time_window_is_empty() {
        let pipeline = EventPipeline::without_cache(Arc::new(StaticEventSource::new(TABLE)));
        let request = EventRequest::new(1, ["A"]).with_time_range(Some(2000), Some(1000));

        let mut stream = pipeline.stream_events(request.clone(), CancellationToken::new());
        assert!(stream.next().is_none());
        let stats = stream.finish().unwrap();
        assert_eq!(stats.rows_accepted, 2);
        assert_eq!(stats.chunks_emitted, 0);

        assert_eq!(pipeline.get_events(&request).unwrap().count(), 0);
    }

    #[test]
    fn test_with_config() {
        let pipeline = pipeline().with_config(PipelineConfig::default().with_chunk_size(5));
        assert_eq!(pipeline.config().chunk_size, 5);
    }
}
