// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Event requests shared by both transports.
//!
//! Requests deserialize from the camelCase JSON the web client sends:
//!
//! ```json
//! {
//!   "studyId": 2911040,
//!   "localIdentifiers": ["A1", "A2"],
//!   "geometryType": "linestring",
//!   "options": { "eventProfile": "EURING_01" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Geometry requested for the features.
///
/// Accepted for compatibility with the web client; the pipeline always builds
/// line strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    /// One feature per sample
    Point,
    /// One feature per consecutive sample pair
    #[serde(alias = "lineString", alias = "line_string")]
    LineString,
}

/// Optional knobs passed through to the provider and the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventOptions {
    /// Cap on samples per individual
    pub max_events_per_individual: Option<u32>,
    /// Inclusive lower bound, ms since epoch
    pub timestamp_start: Option<i64>,
    /// Inclusive upper bound, ms since epoch
    pub timestamp_end: Option<i64>,
    /// Comma separated attribute list for the provider
    pub attributes: Option<String>,
    /// Named event profile; part of the cache key
    pub event_profile: Option<String>,
}

/// A request for the movement segments of some individuals of one study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    /// Study the individuals belong to
    pub study_id: i64,
    /// Individuals to fetch; must not be empty for any work to happen
    #[serde(default)]
    pub local_identifiers: Vec<String>,
    /// Sensor type filter (e.g. "gps")
    #[serde(default)]
    pub sensor_type: Option<String>,
    /// Requested geometry
    #[serde(default)]
    pub geometry_type: Option<GeometryType>,
    /// Provider and cache options
    #[serde(default)]
    pub options: EventOptions,
}

impl EventRequest {
    /// Create a request for the given individuals with default options.
    pub fn new<I, S>(study_id: i64, local_identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            study_id,
            local_identifiers: local_identifiers.into_iter().map(Into::into).collect(),
            sensor_type: None,
            geometry_type: None,
            options: EventOptions::default(),
        }
    }

    /// Parse a request from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the sensor type.
    pub fn with_sensor_type(mut self, sensor_type: impl Into<String>) -> Self {
        self.sensor_type = Some(sensor_type.into());
        self
    }

    /// Set the event profile used for cache keys.
    pub fn with_event_profile(mut self, profile: impl Into<String>) -> Self {
        self.options.event_profile = Some(profile.into());
        self
    }

    /// Cap the number of samples kept per individual.
    pub fn with_max_events_per_individual(mut self, max: u32) -> Self {
        self.options.max_events_per_individual = Some(max);
        self
    }

    /// Restrict the time window.
    pub fn with_time_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.options.timestamp_start = start;
        self.options.timestamp_end = end;
        self
    }

    /// Whether the request names no individuals.
    ///
    /// Empty requests short-circuit to an empty result on both transports.
    pub fn is_empty(&self) -> bool {
        self.local_identifiers.is_empty()
    }

    /// Event profile for cache keys, empty when none was given.
    pub fn event_profile(&self) -> &str {
        self.options.event_profile.as_deref().unwrap_or("")
    }

    /// Render the provider query for an HTTP-backed event source.
    ///
    /// Parameter names follow the Movebank REST event export.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("entity_type", "event".to_string()),
            ("study_id", self.study_id.to_string()),
        ];
        if !self.local_identifiers.is_empty() {
            params.push((
                "individual_local_identifier",
                self.local_identifiers.join(","),
            ));
        }
        if let Some(sensor) = &self.sensor_type {
            params.push(("sensor_type", sensor.clone()));
        }
        if let Some(max) = self.options.max_events_per_individual {
            params.push(("max_events_per_individual", max.to_string()));
        }
        if let Some(start) = self.options.timestamp_start {
            params.push(("timestamp_start", start.to_string()));
        }
        if let Some(end) = self.options.timestamp_end {
            params.push(("timestamp_end", end.to_string()));
        }
        if let Some(attributes) = &self.options.attributes {
            params.push(("attributes", attributes.clone()));
        }
        params
    }
}
