// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streaming transport.
//!
//! A producer thread runs fetch, decode, group, chunk and encode for one
//! request and pushes encoded chunks through a bounded crossbeam channel. The
//! consumer pulls them through [`EventStream`], which is a plain iterator; the
//! channel capacity bounds how far the producer can run ahead.
//!
//! The table is decoded and grouped before the first chunk is built. A read
//! failure partway through the table fails the request before anything is
//! emitted or cached.
//!
//! Cancellation is cooperative. The producer checks the
//! [`CancellationToken`] while decoding and before every chunk it emits.
//! Dropping the stream, or the consumer side of the channel going away,
//! counts as cancellation. Individuals whose chunks were all emitted before
//! the stop keep their cache write; the individual in progress gets none.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::chunker::{ChunkEvent, ChunkPlanner};
use super::grouper::{group_samples, GroupFilter, GroupOrder};
use crate::core::{Result, TrackError};
use crate::encoding::ChunkEncoder;
use crate::io::{CacheKey, EventRequest, EventSource, IndividualCache, RecordDecoder};
use crate::types::Chunk;

/// Shared cancellation flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Statistics from one streamed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Identifier attached to the request's log span
    pub request_id: Uuid,
    /// Rows decoded into samples
    pub rows_accepted: u64,
    /// Rows skipped as malformed
    pub rows_dropped: u64,
    /// Individuals whose chunks were all emitted
    pub individuals_completed: usize,
    /// Encoded chunks handed to the channel
    pub chunks_emitted: usize,
    /// Segments inside the emitted chunks
    pub segments_emitted: usize,
    /// Successful cache writes
    pub cache_writes: usize,
    /// The producer stopped on cancellation
    pub cancelled: bool,
    /// The producer stopped on an encoding or upstream read failure
    pub failed: bool,
}

/// Everything the producer thread needs for one request.
pub(crate) struct Producer {
    pub source: Arc<dyn EventSource>,
    pub cache: Arc<dyn IndividualCache>,
    pub encoder: Arc<dyn ChunkEncoder>,
    pub request: EventRequest,
    pub chunk_size: usize,
    pub token: CancellationToken,
    pub request_id: Uuid,
}

impl Producer {
    fn run(self, sender: Sender<Result<Vec<u8>>>) -> StreamStats {
        let span = info_span!(
            "stream_events",
            request_id = %self.request_id,
            study_id = self.request.study_id
        );
        let _enter = span.enter();

        let mut stats = StreamStats {
            request_id: self.request_id,
            ..StreamStats::default()
        };

        debug!(query = ?self.request.query_params(), "fetching event table");
        let table = match self.source.fetch_event_table(&self.request) {
            Ok(Some(table)) => table,
            Ok(None) => {
                info!("upstream returned no data");
                return stats;
            }
            Err(e) => {
                warn!(
                    context = "fetch_event_table",
                    error = %e,
                    fields = ?e.log_fields(),
                    "upstream fetch failed, ending stream empty"
                );
                return stats;
            }
        };

        let mut decoder = match RecordDecoder::new(table) {
            Ok(decoder) => decoder,
            Err(e) => {
                warn!(
                    context = "decode_header",
                    error = %e,
                    "unreadable event table, ending stream empty"
                );
                return stats;
            }
        };

        let token = self.token.clone();
        let groups = group_samples(
            decoder.by_ref().take_while(|_| !token.is_cancelled()),
            GroupFilter::from_request(&self.request),
            GroupOrder::Arrival,
        );
        let decoded = decoder.stats();
        stats.rows_accepted = decoded.rows_accepted;
        stats.rows_dropped = decoded.rows_dropped;
        if let Some(e) = decoder.take_error() {
            error!(
                context = "decode_table",
                error = %e,
                fields = ?e.log_fields(),
                "event table cut off, failing request"
            );
            stats.failed = true;
            let _ = sender.send(Err(e));
            return stats;
        }
        debug!(
            rows_accepted = decoded.rows_accepted,
            rows_dropped = decoded.rows_dropped,
            individuals = groups.len(),
            "event table decoded"
        );

        let mut pending: Vec<Chunk> = Vec::new();
        for event in ChunkPlanner::new(groups.into_iter(), self.chunk_size) {
            match event {
                ChunkEvent::Chunk(chunk) => {
                    if self.token.is_cancelled() {
                        stats.cancelled = true;
                        break;
                    }
                    let bytes = match self.encoder.encode(&chunk) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            error!(
                                context = "encode_chunk",
                                individual = %chunk.individual_local_identifier,
                                index = chunk.index,
                                error = %e,
                                "chunk encoding failed, aborting stream"
                            );
                            stats.failed = true;
                            let _ = sender.send(Err(e));
                            break;
                        }
                    };
                    if sender.send(Ok(bytes)).is_err() {
                        debug!("consumer went away");
                        stats.cancelled = true;
                        break;
                    }
                    stats.chunks_emitted += 1;
                    stats.segments_emitted += chunk.segments.len();
                    pending.push(chunk);
                }
                ChunkEvent::IndividualComplete {
                    individual_local_identifier,
                    chunk_count,
                } => {
                    stats.individuals_completed += 1;
                    let key = CacheKey::new(
                        self.request.study_id,
                        individual_local_identifier,
                        self.request.event_profile(),
                    );
                    match self.cache.add_individual(&key, std::mem::take(&mut pending)) {
                        Ok(()) => stats.cache_writes += 1,
                        Err(e) => warn!(
                            context = "cache_write",
                            key = %key,
                            error = %e,
                            fields = ?e.log_fields(),
                            "cache write failed"
                        ),
                    }
                    debug!(key = %key, chunks = chunk_count, "individual complete");
                }
            }
        }

        if self.token.is_cancelled() {
            stats.cancelled = true;
        }
        info!(
            chunks = stats.chunks_emitted,
            segments = stats.segments_emitted,
            individuals = stats.individuals_completed,
            cancelled = stats.cancelled,
            failed = stats.failed,
            "stream finished"
        );
        stats
    }

    /// Start the producer on its own thread.
    pub(crate) fn spawn(self, thread_name: &str, capacity: usize) -> EventStream {
        let token = self.token.clone();
        let (sender, receiver) = bounded(capacity.max(1));
        let spawned = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || self.run(sender));

        match spawned {
            Ok(handle) => EventStream {
                receiver: Some(receiver),
                handle: Some(handle),
                token,
                pending_error: None,
            },
            Err(e) => EventStream::failed(TrackError::Other(format!(
                "failed to spawn producer thread: {e}"
            ))),
        }
    }
}

/// Consumer side of a streamed request.
///
/// Yields encoded chunks in emission order. An `Err` item is terminal: it is
/// the last item the stream yields.
pub struct EventStream {
    receiver: Option<Receiver<Result<Vec<u8>>>>,
    handle: Option<JoinHandle<StreamStats>>,
    token: CancellationToken,
    pending_error: Option<TrackError>,
}

impl EventStream {
    /// A stream that ends immediately.
    pub fn empty() -> Self {
        Self {
            receiver: None,
            handle: None,
            token: CancellationToken::new(),
            pending_error: None,
        }
    }

    /// A stream whose only item is `err`.
    pub fn failed(err: TrackError) -> Self {
        Self {
            receiver: None,
            handle: None,
            token: CancellationToken::new(),
            pending_error: Some(err),
        }
    }

    /// Ask the producer to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token shared with the producer.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop the producer, wait for it and return its statistics.
    ///
    /// Calling this after the stream was drained does not change the outcome;
    /// the producer has already finished by then.
    pub fn finish(mut self) -> Result<StreamStats> {
        self.token.cancel();
        self.receiver.take();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TrackError::Other("producer thread panicked".to_string())),
            None => Ok(StreamStats::default()),
        }
    }
}

impl Iterator for EventStream {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending_error.take() {
            self.receiver.take();
            return Some(Err(err));
        }
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(Ok(bytes)) => Some(Ok(bytes)),
            Ok(Err(e)) => {
                self.receiver.take();
                Some(Err(e))
            }
            Err(_) => {
                self.receiver.take();
                None
            }
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
