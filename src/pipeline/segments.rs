// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Segment builder.
//!
//! Turns one individual's ordered samples into consecutive-pair line-string
//! segments with per-segment and cumulative great-circle distance.

use crate::types::{format_timestamp, LocationSample, Point, Segment};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two latitude/longitude points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1.0 for near-antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Display label for a segment.
pub fn segment_label(
    individual: &str,
    source_timestamp: i64,
    destination_timestamp: i64,
    distance_km: f64,
    cumulative_distance_km: f64,
) -> String {
    format!(
        "{individual}: {} -> {}, {distance_km:.3} km (total {cumulative_distance_km:.3} km)",
        format_timestamp(source_timestamp),
        format_timestamp(destination_timestamp),
    )
}

/// Lazy iterator of segments over one individual's samples.
///
/// Yields one segment per consecutive pair, so N samples give N-1 segments
/// and fewer than two samples give none.
pub struct SegmentBuilder<I: Iterator<Item = LocationSample>> {
    individual: String,
    samples: I,
    previous: Option<LocationSample>,
    cumulative_km: f64,
}

impl<I: Iterator<Item = LocationSample>> SegmentBuilder<I> {
    /// Start building segments for an individual.
    pub fn new<T>(individual: impl Into<String>, samples: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        let mut samples = samples.into_iter();
        let previous = samples.next();
        Self {
            individual: individual.into(),
            samples,
            previous,
            cumulative_km: 0.0,
        }
    }

    /// Distance accumulated over the segments built so far.
    pub fn cumulative_km(&self) -> f64 {
        self.cumulative_km
    }
}

impl<I: Iterator<Item = LocationSample>> Iterator for SegmentBuilder<I> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let current = self.samples.next()?;
        let previous = self.previous.replace(current.clone())?;

        let distance_km = haversine_km(
            previous.latitude,
            previous.longitude,
            current.latitude,
            current.longitude,
        );
        self.cumulative_km += distance_km;

        Some(Segment {
            source: Point::new(previous.longitude, previous.latitude),
            target: Point::new(current.longitude, current.latitude),
            content: segment_label(
                &self.individual,
                previous.timestamp,
                current.timestamp,
                distance_km,
                self.cumulative_km,
            ),
            source_timestamp: previous.timestamp,
            destination_timestamp: current.timestamp,
            distance_km,
            cumulative_distance_km: self.cumulative_km,
        })
    }
}
