// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoded location samples and timestamp helpers.

use chrono::{DateTime, NaiveDateTime, Utc};

/// One decoded, validated location reading for an individual.
///
/// Samples only exist for rows whose timestamp, latitude and longitude all
/// parsed; everything else is dropped by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSample {
    /// Milliseconds since the Unix epoch (UTC)
    pub timestamp: i64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Provider's numeric individual id
    pub individual_id: Option<i64>,
    /// Provider's numeric tag id
    pub tag_id: Option<i64>,
    /// Study-local individual name used for grouping
    pub individual_local_identifier: String,
    /// Canonical taxon name of the individual
    pub taxon_canonical_name: Option<String>,
}

impl LocationSample {
    /// Create a sample with only the required fields set.
    pub fn new(
        individual_local_identifier: impl Into<String>,
        timestamp: i64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            individual_id: None,
            tag_id: None,
            individual_local_identifier: individual_local_identifier.into(),
            taxon_canonical_name: None,
        }
    }
}

/// An individual's samples, in the order the grouper produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualGroup {
    /// Study-local individual name
    pub individual_local_identifier: String,
    /// Samples for this individual
    pub samples: Vec<LocationSample>,
}

impl IndividualGroup {
    /// Create an empty group.
    pub fn new(individual_local_identifier: impl Into<String>) -> Self {
        Self {
            individual_local_identifier: individual_local_identifier.into(),
            samples: Vec::new(),
        }
    }

    /// Sort samples ascending by timestamp. Equal timestamps keep arrival order.
    pub fn sort_by_timestamp(&mut self) {
        self.samples.sort_by_key(|s| s.timestamp);
    }

    /// Number of samples in the group.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the group has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Parse a provider timestamp into milliseconds since the Unix epoch.
///
/// Accepts:
/// - Movebank export format: "2021-03-04 05:06:07.890" (fraction optional, UTC)
/// - RFC 3339: "2021-03-04T05:06:07Z"
/// - Integer milliseconds: "1614834367890"
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Format milliseconds since the Unix epoch for display.
pub fn format_timestamp(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{ms} ms"),
    }
}
