// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core pipeline data structures.
//!
//! This module contains the data that flows through the pipeline:
//! LocationSample, IndividualGroup, Segment, Chunk and FeatureCollection.

pub mod chunk;
pub mod sample;
pub mod segment;

pub use chunk::{Chunk, FeatureCollection};
pub use sample::{format_timestamp, parse_timestamp, IndividualGroup, LocationSample};
pub use segment::{Point, Segment};
