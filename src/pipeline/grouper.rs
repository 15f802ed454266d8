// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Individual grouper.
//!
//! Partitions decoded samples by individual local identifier. Groups come out
//! in first-seen order; samples inside a group keep arrival order unless the
//! grouper is asked to sort them by timestamp.
//!
//! The streaming transport groups in arrival order and the batch transport
//! sorts, so the two transports can build different segments from the same
//! table when rows arrive out of time order.

use std::collections::{HashMap, HashSet};

use crate::io::EventRequest;
use crate::types::{IndividualGroup, LocationSample};

/// Order of samples within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Keep decode order
    #[default]
    Arrival,
    /// Sort ascending by timestamp (stable)
    Timestamp,
}

/// Which samples the grouper keeps.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    identifiers: Option<HashSet<String>>,
    max_per_individual: Option<usize>,
    timestamp_start: Option<i64>,
    timestamp_end: Option<i64>,
}

impl GroupFilter {
    /// Keep every sample.
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep the requested individuals, window and per-individual cap.
    pub fn from_request(request: &EventRequest) -> Self {
        Self {
            identifiers: Some(request.local_identifiers.iter().cloned().collect()),
            max_per_individual: request
                .options
                .max_events_per_individual
                .map(|m| m as usize),
            timestamp_start: request.options.timestamp_start,
            timestamp_end: request.options.timestamp_end,
        }
    }

    fn admits(&self, sample: &LocationSample) -> bool {
        if let Some(ids) = &self.identifiers {
            if !ids.contains(&sample.individual_local_identifier) {
                return false;
            }
        }
        self.timestamp_start.map_or(true, |s| sample.timestamp >= s)
            && self.timestamp_end.map_or(true, |e| sample.timestamp <= e)
    }
}

/// Buffered group-by over a sample stream.
///
/// The input is drained on the first call to `next`; groups are then handed
/// out one at a time.
pub struct IndividualGrouper<I: Iterator<Item = LocationSample>> {
    input: Option<I>,
    filter: GroupFilter,
    order: GroupOrder,
    groups: std::vec::IntoIter<IndividualGroup>,
}

impl<I: Iterator<Item = LocationSample>> IndividualGrouper<I> {
    /// Create a grouper over a sample stream.
    pub fn new(input: I, filter: GroupFilter, order: GroupOrder) -> Self {
        Self {
            input: Some(input),
            filter,
            order,
            groups: Vec::new().into_iter(),
        }
    }

    fn drain(&mut self, input: I) {
        let mut groups: Vec<IndividualGroup> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for sample in input {
            if !self.filter.admits(&sample) {
                continue;
            }
            let pos = match positions.get(&sample.individual_local_identifier) {
                Some(&pos) => pos,
                None => {
                    positions.insert(sample.individual_local_identifier.clone(), groups.len());
                    groups.push(IndividualGroup::new(
                        sample.individual_local_identifier.clone(),
                    ));
                    groups.len() - 1
                }
            };
            let group = &mut groups[pos];
            if self
                .filter
                .max_per_individual
                .map_or(true, |max| group.samples.len() < max)
            {
                group.samples.push(sample);
            }
        }

        if self.order == GroupOrder::Timestamp {
            for group in &mut groups {
                group.sort_by_timestamp();
            }
        }

        self.groups = groups.into_iter();
    }
}

impl<I: Iterator<Item = LocationSample>> Iterator for IndividualGrouper<I> {
    type Item = IndividualGroup;

    fn next(&mut self) -> Option<IndividualGroup> {
        if let Some(input) = self.input.take() {
            self.drain(input);
        }
        self.groups.next()
    }
}

/// Group a sample stream eagerly.
pub fn group_samples<I>(input: I, filter: GroupFilter, order: GroupOrder) -> Vec<IndividualGroup>
where
    I: IntoIterator<Item = LocationSample>,
{
    IndividualGrouper::new(input.into_iter(), filter, order).collect()
}
