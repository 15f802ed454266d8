// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Line-string movement segments.

/// A longitude/latitude coordinate pair (GeoJSON order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Longitude in degrees
    pub longitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// A line connecting two consecutive samples of the same individual.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Location of the earlier sample
    pub source: Point,
    /// Location of the later sample
    pub target: Point,
    /// Display label
    pub content: String,
    /// Timestamp of the source sample (ms since epoch)
    pub source_timestamp: i64,
    /// Timestamp of the target sample (ms since epoch)
    pub destination_timestamp: i64,
    /// Great-circle length of this segment in kilometers
    pub distance_km: f64,
    /// Running total for the individual up to and including this segment
    pub cumulative_distance_km: f64,
}

impl Segment {
    /// Time covered by this segment in milliseconds.
    ///
    /// Saturates instead of overflowing on extreme timestamps.
    pub fn duration_ms(&self) -> i64 {
        self.destination_timestamp.saturating_sub(self.source_timestamp)
    }
}
