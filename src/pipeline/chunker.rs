// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunking state machine.
//!
//! [`ChunkPlanner`] walks individual groups, builds their segments lazily and
//! seals them into chunks of at most `chunk_size` segments:
//!
//! ```text
//!            +--------------------------------------------+
//!            v                                            |
//! NextIndividual --group--> Accumulating --size reached--> FlushFull
//!     |   ^                      |
//!     |   |                 segments end
//!     |   |                      v
//!     |   +---------------- FlushTrail
//!     |
//!  no more groups --> Done
//! ```
//!
//! The trailing chunk is sealed whenever an individual's segments end, even if
//! it holds no segments. An individual whose segment count is an exact
//! multiple of `chunk_size` therefore ends with an empty chunk, and an
//! individual with fewer than two samples yields a single empty chunk.

use std::vec;

use super::segments::SegmentBuilder;
use crate::types::{Chunk, IndividualGroup, LocationSample, Segment};

/// States of the chunking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Pulling segments for the current individual
    Accumulating,
    /// Chunk size reached; seal and continue with the same individual
    FlushFull,
    /// Segments exhausted; seal the trailing chunk
    FlushTrail,
    /// Finish the current individual and advance to the next group
    NextIndividual,
    /// No more groups
    Done,
}

/// Output of the planner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    /// A sealed chunk, ready for encoding
    Chunk(Chunk),
    /// Every chunk of this individual has been emitted
    IndividualComplete {
        /// Individual that finished
        individual_local_identifier: String,
        /// Number of chunks it produced
        chunk_count: u32,
    },
}

struct Current {
    individual: String,
    segments: SegmentBuilder<vec::IntoIter<LocationSample>>,
}

/// Drives groups through segment building and chunk sealing.
pub struct ChunkPlanner<G: Iterator<Item = IndividualGroup>> {
    groups: G,
    chunk_size: usize,
    state: ChunkState,
    current: Option<Current>,
    buffer: Vec<Segment>,
    index: u32,
}

impl<G: Iterator<Item = IndividualGroup>> ChunkPlanner<G> {
    /// Create a planner over a group sequence.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn new(groups: G, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            groups,
            chunk_size,
            state: ChunkState::NextIndividual,
            current: None,
            buffer: Vec::with_capacity(chunk_size),
            index: 0,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    fn seal(&mut self) -> Chunk {
        let individual = self
            .current
            .as_ref()
            .map(|c| c.individual.clone())
            .unwrap_or_default();
        let segments = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.chunk_size));
        let chunk = Chunk::new(individual, segments, self.index);
        self.index += 1;
        chunk
    }
}

impl<G: Iterator<Item = IndividualGroup>> Iterator for ChunkPlanner<G> {
    type Item = ChunkEvent;

    fn next(&mut self) -> Option<ChunkEvent> {
        loop {
            match self.state {
                ChunkState::Done => return None,
                ChunkState::NextIndividual => {
                    if let Some(done) = self.current.take() {
                        return Some(ChunkEvent::IndividualComplete {
                            individual_local_identifier: done.individual,
                            chunk_count: self.index,
                        });
                    }
                    match self.groups.next() {
                        Some(group) => {
                            let individual = group.individual_local_identifier;
                            self.current = Some(Current {
                                segments: SegmentBuilder::new(individual.clone(), group.samples),
                                individual,
                            });
                            self.index = 0;
                            self.buffer.clear();
                            self.state = ChunkState::Accumulating;
                        }
                        None => {
                            self.state = ChunkState::Done;
                            return None;
                        }
                    }
                }
                ChunkState::Accumulating => {
                    let next = self.current.as_mut().and_then(|c| c.segments.next());
                    match next {
                        Some(segment) => {
                            self.buffer.push(segment);
                            if self.buffer.len() >= self.chunk_size {
                                self.state = ChunkState::FlushFull;
                            }
                        }
                        None => self.state = ChunkState::FlushTrail,
                    }
                }
                ChunkState::FlushFull => {
                    self.state = ChunkState::Accumulating;
                    return Some(ChunkEvent::Chunk(self.seal()));
                }
                ChunkState::FlushTrail => {
                    self.state = ChunkState::NextIndividual;
                    return Some(ChunkEvent::Chunk(self.seal()));
                }
            }
        }
    }
}

/// Build every chunk for one group.
pub fn chunk_individual(group: IndividualGroup, chunk_size: usize) -> Vec<Chunk> {
    ChunkPlanner::new(std::iter::once(group), chunk_size)
        .filter_map(|event| match event {
            ChunkEvent::Chunk(chunk) => Some(chunk),
            ChunkEvent::IndividualComplete { .. } => None,
        })
        .collect()
}
