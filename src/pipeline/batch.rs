// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Batch transport.
//!
//! Materializes the whole decoded table, sorts every individual by timestamp
//! and builds the complete [`FeatureCollection`] before the first chunk is
//! handed out. Individuals are independent once grouped, so their chunks are
//! built on the rayon pool.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::chunker::chunk_individual;
use super::grouper::{group_samples, GroupFilter, GroupOrder};
use crate::core::Result;
use crate::io::{EventRequest, EventSource, RecordDecoder};
use crate::types::{Chunk, FeatureCollection};

/// Chunks of a batch request, in individual order then chunk index order.
pub struct ChunkStream {
    inner: Box<dyn Iterator<Item = Chunk> + Send>,
    total: usize,
}

impl ChunkStream {
    /// Stream every chunk of a collection.
    pub fn new(collection: FeatureCollection) -> Self {
        let total = collection.chunk_count();
        Self {
            inner: Box::new(collection.into_chunks()),
            total,
        }
    }

    /// A stream with no chunks.
    pub fn empty() -> Self {
        Self::new(FeatureCollection::new())
    }

    /// Number of chunks the stream started with.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for ChunkStream {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        self.inner.next()
    }
}

/// Fetch, sort and build every chunk for a request.
///
/// Upstream failures and unreadable tables give an empty collection.
///
/// # Errors
///
/// Returns [`TrackError::Upstream`](crate::core::TrackError::Upstream) if the
/// table stops partway through.
pub(crate) fn build_collection(
    source: &dyn EventSource,
    request: &EventRequest,
    chunk_size: usize,
) -> Result<FeatureCollection> {
    let table = match source.fetch_event_table(request) {
        Ok(Some(table)) => table,
        Ok(None) => {
            info!(study_id = request.study_id, "upstream returned no data");
            return Ok(FeatureCollection::new());
        }
        Err(e) => {
            warn!(
                context = "fetch_event_table",
                study_id = request.study_id,
                error = %e,
                fields = ?e.log_fields(),
                "upstream fetch failed, returning no chunks"
            );
            return Ok(FeatureCollection::new());
        }
    };

    let mut decoder = match RecordDecoder::new(table) {
        Ok(decoder) => decoder,
        Err(e) => {
            warn!(
                context = "decode_header",
                study_id = request.study_id,
                error = %e,
                "unreadable event table, returning no chunks"
            );
            return Ok(FeatureCollection::new());
        }
    };

    let samples: Vec<_> = decoder.by_ref().collect();
    if let Some(e) = decoder.take_error() {
        warn!(
            context = "decode_table",
            study_id = request.study_id,
            error = %e,
            "event table cut off, failing request"
        );
        return Err(e);
    }
    let stats = decoder.stats();
    debug!(
        rows_accepted = stats.rows_accepted,
        rows_dropped = stats.rows_dropped,
        "event table materialized"
    );

    let groups = group_samples(
        samples,
        GroupFilter::from_request(request),
        GroupOrder::Timestamp,
    );

    let individuals: Vec<(String, Vec<Chunk>)> = groups
        .into_par_iter()
        .map(|group| {
            let id = group.individual_local_identifier.clone();
            (id, chunk_individual(group, chunk_size))
        })
        .collect();

    let collection = FeatureCollection { individuals };
    info!(
        study_id = request.study_id,
        individuals = collection.individuals.len(),
        chunks = collection.chunk_count(),
        segments = collection.segment_count(),
        "feature collection built"
    );
    Ok(collection)
}
