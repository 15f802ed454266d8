// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunk data structures.
//!
//! A chunk is the unit of wire transmission: a bounded batch of segments
//! for one individual, numbered from 0 within that individual.

use super::segment::Segment;

/// A bounded batch of segments for one individual.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Individual the segments belong to
    pub individual_local_identifier: String,
    /// Segments in build order
    pub segments: Vec<Segment>,
    /// Number of segments (kept alongside the list on the wire)
    pub count: u32,
    /// Position of this chunk within the individual's chunk sequence
    pub index: u32,
}

impl Chunk {
    /// Seal a chunk from an accumulated segment list.
    pub fn new(
        individual_local_identifier: impl Into<String>,
        segments: Vec<Segment>,
        index: u32,
    ) -> Self {
        let count = segments.len() as u32;
        Self {
            individual_local_identifier: individual_local_identifier.into(),
            segments,
            count,
            index,
        }
    }

    /// Check if this chunk carries no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Cumulative distance at the end of this chunk, if it has segments.
    pub fn end_distance_km(&self) -> Option<f64> {
        self.segments.last().map(|s| s.cumulative_distance_km)
    }
}

/// Every chunk built for every individual, in build order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// Chunks grouped per individual, individuals in grouping order
    pub individuals: Vec<(String, Vec<Chunk>)>,
}

impl FeatureCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of chunks across all individuals.
    pub fn chunk_count(&self) -> usize {
        self.individuals.iter().map(|(_, chunks)| chunks.len()).sum()
    }

    /// Total number of segments across all individuals.
    pub fn segment_count(&self) -> usize {
        self.individuals
            .iter()
            .flat_map(|(_, chunks)| chunks.iter())
            .map(|c| c.segments.len())
            .sum()
    }

    /// Check if the collection has no individuals.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Consume the collection into a flat chunk sequence.
    pub fn into_chunks(self) -> impl Iterator<Item = Chunk> {
        self.individuals.into_iter().flat_map(|(_, chunks)| chunks)
    }
}
