// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streaming transport integration tests.
//!
//! These tests drive `EventPipeline::stream_events` end to end: fetch, decode,
//! group, segment, chunk, encode, cache.

mod common;

use std::sync::Arc;

use common::*;
use movecodec::core::{PipelineConfig, Result, TrackError};
use movecodec::io::{CacheKey, EventRequest, FileEventSource, MemoryCache, StaticEventSource};
use movecodec::{CancellationToken, EventPipeline};

fn pipeline_over(table: &str, cache: Arc<MemoryCache>) -> EventPipeline {
    EventPipeline::new(Arc::new(StaticEventSource::new(table)), cache)
}

fn drain(pipeline: &EventPipeline, request: EventRequest) -> Vec<Vec<u8>> {
    pipeline
        .stream_events(request, CancellationToken::new())
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_three_samples_give_one_chunk_of_two() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&track("A1", 3)), cache.clone());

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(1, ["A1"])));
    assert_eq!(shape(&chunks), vec![("A1".to_string(), 0, 2)]);
    assert_eq!(chunks[0].segments.len(), 2);
    assert!(chunks[0].segments[0].content.starts_with("A1: "));
}

#[test]
fn test_single_sample_gives_empty_chunk() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&track("A2", 1)), cache.clone());

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(1, ["A2"])));
    assert_eq!(shape(&chunks), vec![("A2".to_string(), 0, 0)]);
    assert!(chunks[0].segments.is_empty());
    // The individual still completed, so it is cached.
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_empty_request_never_contacts_source() {
    let source = Arc::new(CountingSource::new(&table_of(&track("A1", 3))));
    let cache = Arc::new(MemoryCache::new());
    let pipeline = EventPipeline::new(source.clone(), cache.clone());

    let items = drain(&pipeline, EventRequest::new(1, Vec::<String>::new()));
    assert!(items.is_empty());
    assert_eq!(source.calls(), 0);
    assert!(cache.is_empty());
}

#[test]
fn test_no_upstream_data_leaves_cache_untouched() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = EventPipeline::new(Arc::new(StaticEventSource::empty()), cache.clone());

    let mut stream = pipeline.stream_events(EventRequest::new(1, ["A1"]), CancellationToken::new());
    assert!(stream.next().is_none());
    let stats = stream.finish().unwrap();
    assert_eq!(stats.chunks_emitted, 0);
    assert!(!stats.failed);
    assert!(cache.is_empty());
}

#[test]
fn test_upstream_failure_gives_empty_stream() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = EventPipeline::new(Arc::new(FailingSource), cache.clone());

    let items = drain(&pipeline, EventRequest::new(1, ["A1"]));
    assert!(items.is_empty());
    assert!(cache.is_empty());
}

#[test]
fn test_long_track_splits_at_chunk_size() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&track("A3", 2500)), cache.clone());

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(1, ["A3"])));
    assert_eq!(
        shape(&chunks),
        vec![
            ("A3".to_string(), 0, 1000),
            ("A3".to_string(), 1, 1000),
            ("A3".to_string(), 2, 499),
        ]
    );
    let total: usize = chunks.iter().map(|c| c.segments.len()).sum();
    assert_eq!(total, 2499);
}

// ============================================================================
// Chunking Laws
// ============================================================================

#[test]
fn test_exact_multiple_emits_empty_trailing_chunk() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&track("A4", 1001)), cache);

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(1, ["A4"])));
    assert_eq!(
        shape(&chunks),
        vec![("A4".to_string(), 0, 1000), ("A4".to_string(), 1, 0)]
    );
}

#[test]
fn test_index_resets_per_individual_and_distance_accumulates() {
    let mut rows = track("A", 5);
    rows.extend(track("B", 4));
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&rows), cache)
        .with_config(PipelineConfig::default().with_chunk_size(2));

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(1, ["A", "B"])));
    assert_eq!(
        shape(&chunks),
        vec![
            ("A".to_string(), 0, 2),
            ("A".to_string(), 1, 2),
            ("A".to_string(), 2, 0),
            ("B".to_string(), 0, 2),
            ("B".to_string(), 1, 1),
        ]
    );

    let a_segments: Vec<_> = chunks[..3].iter().flat_map(|c| c.segments.iter()).collect();
    for pair in a_segments.windows(2) {
        let expected = pair[0].cumulative_distance_km + pair[1].distance_km;
        assert!((pair[1].cumulative_distance_km - expected).abs() < 1e-9);
    }
    // B starts again from zero.
    let b_first = &chunks[3].segments[0];
    assert_eq!(b_first.cumulative_distance_km, b_first.distance_km);
}

// ============================================================================
// Request Filtering and Decoding
// ============================================================================

#[test]
fn test_only_requested_individuals_are_streamed() {
    let mut rows = track("A", 3);
    rows.extend(track("Z", 3));
    let pipeline = pipeline_over(&table_of(&rows), Arc::new(MemoryCache::new()));

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(1, ["A"])));
    assert!(chunks.iter().all(|c| c.individual_local_identifier == "A"));
}

#[test]
fn test_malformed_rows_are_dropped() {
    let rows = track("A", 3);
    let table = TableBuilder::new()
        .row(&rows[0])
        .raw("9,not-a-time,5.0,52.0,1,1,A,x")
        .row(&rows[1])
        .raw("10,1700000000000,5.0,95.0,1,1,A,x")
        .raw("11,1700000000000,,52.0,1,1,A,x")
        .row(&rows[2])
        .build();
    let pipeline = pipeline_over(&table, Arc::new(MemoryCache::new()));

    let mut stream = pipeline.stream_events(EventRequest::new(1, ["A"]), CancellationToken::new());
    let chunks = decode_all(&stream.by_ref().collect::<Result<Vec<_>>>().unwrap());
    let stats = stream.finish().unwrap();

    assert_eq!(shape(&chunks), vec![("A".to_string(), 0, 2)]);
    assert_eq!(stats.rows_accepted, 3);
    assert_eq!(stats.rows_dropped, 3);
}

#[test]
fn test_max_events_and_time_range() {
    let rows = track("A", 10);
    let start = rows[2].timestamp_ms;
    let pipeline = pipeline_over(&table_of(&rows), Arc::new(MemoryCache::new()));

    let request = EventRequest::new(1, ["A"])
        .with_time_range(Some(start), None)
        .with_max_events_per_individual(4);
    let chunks = decode_all(&drain(&pipeline, request));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].count, 3);
    assert_eq!(chunks[0].segments[0].source_timestamp, start);
}

#[test]
fn test_point_geometry_streams_line_strings() {
    let pipeline = pipeline_over(&table_of(&track("A", 3)), Arc::new(MemoryCache::new()));
    let request = EventRequest::from_json(
        r#"{"studyId": 1, "localIdentifiers": ["A"], "geometryType": "point"}"#,
    )
    .unwrap();

    let chunks = decode_all(&drain(&pipeline, request));
    assert_eq!(shape(&chunks), vec![("A".to_string(), 0, 2)]);
}

#[test]
fn test_inverted_time_range_streams_nothing() {
    let rows = track("A", 5);
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&rows), cache.clone());
    let request = EventRequest::new(1, ["A"])
        .with_time_range(Some(rows[4].timestamp_ms), Some(rows[0].timestamp_ms));

    assert!(drain(&pipeline, request).is_empty());
    assert!(cache.is_empty());
}

#[test]
fn test_file_source_streams_study_table() {
    let (dir, _guard) = data_dir_with("stream_file", 2911040, &table_of(&track("A1", 4)));
    let pipeline = EventPipeline::without_cache(Arc::new(FileEventSource::new(&dir)));

    let chunks = decode_all(&drain(&pipeline, EventRequest::new(2911040, ["A1"])));
    assert_eq!(shape(&chunks), vec![("A1".to_string(), 0, 3)]);

    // Unknown study: no table, no output.
    assert!(drain(&pipeline, EventRequest::new(7, ["A1"])).is_empty());
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn test_cache_written_per_completed_individual() {
    let mut rows = track("A", 4);
    rows.extend(track("B", 2));
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&rows), cache.clone());

    let request = EventRequest::new(42, ["A", "B"]).with_event_profile("EURING_01");
    let chunks = decode_all(&drain(&pipeline, request));

    assert_eq!(cache.len(), 2);
    let key_a = CacheKey::new(42, "A", "EURING_01");
    let cached = cache.get(&key_a).unwrap();
    assert_eq!(cached, vec![chunks[0].clone()]);
    assert_eq!(
        cache.keys(),
        vec![key_a, CacheKey::new(42, "B", "EURING_01")]
    );
}

#[test]
fn test_cache_key_uses_empty_profile_by_default() {
    let cache = Arc::new(MemoryCache::new());
    let pipeline = pipeline_over(&table_of(&track("A", 2)), cache.clone());
    drain(&pipeline, EventRequest::new(5, ["A"]));
    assert!(cache.get(&CacheKey::new(5, "A", "")).is_some());
}

// ============================================================================
// Cancellation and Failure
// ============================================================================

#[test]
fn test_cancellation_stops_before_next_chunk() {
    let mut rows = track("A", 5);
    rows.extend(track("B", 3));
    let cache = Arc::new(MemoryCache::new());
    let token = CancellationToken::new();
    let pipeline = pipeline_over(&table_of(&rows), cache.clone())
        .with_config(PipelineConfig::default().with_chunk_size(2))
        .with_encoder(Arc::new(CancellingEncoder::new(token.clone(), 4)));

    let mut stream = pipeline.stream_events(EventRequest::new(1, ["A", "B"]), token);
    let items = stream.by_ref().collect::<Result<Vec<_>>>().unwrap();
    let stats = stream.finish().unwrap();

    // A: [2, 2, 0], then B's first chunk; B's trailing chunk is never emitted.
    let chunks = decode_all(&items);
    assert_eq!(
        shape(&chunks),
        vec![
            ("A".to_string(), 0, 2),
            ("A".to_string(), 1, 2),
            ("A".to_string(), 2, 0),
            ("B".to_string(), 0, 2),
        ]
    );
    assert!(stats.cancelled);
    assert_eq!(stats.individuals_completed, 1);
    assert_eq!(cache.keys(), vec![CacheKey::new(1, "A", "")]);
}

#[test]
fn test_cancellation_while_decoding_emits_nothing() {
    let cache = Arc::new(MemoryCache::new());
    let token = CancellationToken::new();
    let source = CutoffSource::cancelling(&table_of(&track("A", 100)), 30, token.clone());
    let pipeline = EventPipeline::new(Arc::new(source), cache.clone());

    let mut stream = pipeline.stream_events(EventRequest::new(1, ["A"]), token);
    assert!(stream.next().is_none());
    let stats = stream.finish().unwrap();

    assert!(stats.cancelled);
    assert!(stats.rows_accepted < 100, "{}", stats.rows_accepted);
    assert_eq!(stats.chunks_emitted, 0);
    assert_eq!(stats.individuals_completed, 0);
    assert!(cache.is_empty());
}

#[test]
fn test_table_cut_off_midway_fails_without_caching() {
    let cache = Arc::new(MemoryCache::new());
    let source = CutoffSource::failing(&table_of(&track("A", 100)), 50);
    let pipeline = EventPipeline::new(Arc::new(source), cache.clone());

    let mut stream = pipeline.stream_events(EventRequest::new(1, ["A"]), CancellationToken::new());
    let items: Vec<_> = stream.by_ref().collect();
    let stats = stream.finish().unwrap();

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(TrackError::Upstream { .. })));
    assert!(stats.failed);
    assert_eq!(stats.rows_accepted, 50);
    assert_eq!(stats.chunks_emitted, 0);
    assert!(cache.is_empty());
}

#[test]
fn test_dropping_consumer_stops_producer() {
    let rows: Vec<_> = (0..50)
        .flat_map(|i| track(&format!("I{i:02}"), 2))
        .collect();
    let ids: Vec<String> = (0..50).map(|i| format!("I{i:02}")).collect();
    let pipeline = pipeline_over(&table_of(&rows), Arc::new(MemoryCache::new()))
        .with_config(PipelineConfig::default().with_channel_capacity(1));

    let mut stream = pipeline.stream_events(EventRequest::new(1, ids), CancellationToken::new());
    assert!(stream.next().unwrap().is_ok());
    let stats = stream.finish().unwrap();

    assert!(stats.cancelled);
    assert!(stats.chunks_emitted < 50, "{}", stats.chunks_emitted);
}

#[test]
fn test_encode_failure_ends_stream() {
    let mut rows = track("A", 3);
    rows.extend(track("B", 3));
    rows.extend(track("C", 3));
    let cache = Arc::new(MemoryCache::new());
    let encoder = FailingEncoder::new("B");
    let pipeline = pipeline_over(&table_of(&rows), cache.clone()).with_encoder(encoder.clone());

    let mut stream =
        pipeline.stream_events(EventRequest::new(1, ["A", "B", "C"]), CancellationToken::new());
    let items: Vec<_> = stream.by_ref().collect();
    let stats = stream.finish().unwrap();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(TrackError::Encode { .. })));
    assert!(items[1].as_ref().unwrap_err().is_encode());
    assert_eq!(encoder.seen(), vec!["A", "B"]);
    assert!(stats.failed);
    assert_eq!(cache.keys(), vec![CacheKey::new(1, "A", "")]);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_streaming_is_deterministic() {
    let mut rows = track("A", 40);
    rows.extend(track("B", 25));
    // Interleave and reverse part of the table.
    rows.swap(3, 45);
    rows[10..30].reverse();
    let table = table_of(&rows);
    let request = EventRequest::new(1, ["A", "B"]);

    let config = PipelineConfig::default().with_chunk_size(7);
    let first = drain(
        &pipeline_over(&table, Arc::new(MemoryCache::new())).with_config(config.clone()),
        request.clone(),
    );
    let second = drain(
        &pipeline_over(&table, Arc::new(MemoryCache::new())).with_config(config),
        request,
    );
    assert_eq!(first, second);
}
