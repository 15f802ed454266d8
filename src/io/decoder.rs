// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record decoder for provider event tables.
//!
//! Turns a CSV byte stream into a lazy sequence of [`LocationSample`]s.
//! Rows missing a parseable timestamp, latitude, longitude or individual
//! identifier are skipped without error. An unreadable header fails
//! [`RecordDecoder::new`]; a read failure partway through ends the iteration
//! and is kept for [`RecordDecoder::take_error`], so a cut-off table is never
//! mistaken for a complete one.
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use movecodec::io::decoder::RecordDecoder;
//!
//! let table = "timestamp,location-lat,location-long,individual-local-identifier\n\
//!              2021-01-01 00:00:00.000,52.1,5.2,A1\n";
//! let mut decoder = RecordDecoder::new(table.as_bytes())?;
//! for sample in decoder.by_ref() {
//!     println!("{} @ {}", sample.individual_local_identifier, sample.timestamp);
//! }
//! if let Some(err) = decoder.take_error() {
//!     return Err(err.into());
//! }
//! println!("dropped {} rows", decoder.stats().rows_dropped);
//! # Ok(())
//! # }
//! ```

use std::io::Read;

use tracing::{debug, warn};

use crate::core::{Result, TrackError};
use crate::types::{parse_timestamp, LocationSample};

/// Source column names.
pub mod columns {
    pub const TIMESTAMP: &str = "timestamp";
    pub const LATITUDE: &str = "location-lat";
    pub const LONGITUDE: &str = "location-long";
    pub const INDIVIDUAL_ID: &str = "individual-id";
    pub const TAG_ID: &str = "tag-id";
    pub const INDIVIDUAL_LOCAL_IDENTIFIER: &str = "individual-local-identifier";
    pub const TAXON_CANONICAL_NAME: &str = "individual-taxon-canonical-name";
}

/// Row counters kept while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Rows turned into samples
    pub rows_accepted: u64,
    /// Rows skipped as malformed
    pub rows_dropped: u64,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    timestamp: usize,
    latitude: usize,
    longitude: usize,
    individual_local_identifier: usize,
    individual_id: Option<usize>,
    tag_id: Option<usize>,
    taxon_canonical_name: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                TrackError::parse("event table", format!("missing required column '{name}'"))
            })
        };

        Ok(Self {
            timestamp: require(columns::TIMESTAMP)?,
            latitude: require(columns::LATITUDE)?,
            longitude: require(columns::LONGITUDE)?,
            individual_local_identifier: require(columns::INDIVIDUAL_LOCAL_IDENTIFIER)?,
            individual_id: find(columns::INDIVIDUAL_ID),
            tag_id: find(columns::TAG_ID),
            taxon_canonical_name: find(columns::TAXON_CANONICAL_NAME),
        })
    }
}

/// Lazy CSV decoder producing validated location samples.
pub struct RecordDecoder<R: Read> {
    reader: csv::Reader<R>,
    columns: ColumnIndex,
    record: csv::StringRecord,
    stats: DecodeStats,
    error: Option<TrackError>,
}

impl<R: Read> RecordDecoder<R> {
    /// Open a decoder over a raw table, reading the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be read or lacks one of the
    /// required columns.
    pub fn new(input: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;

        Ok(Self {
            reader,
            columns,
            record: csv::StringRecord::new(),
            stats: DecodeStats::default(),
            error: None,
        })
    }

    /// Counters for the rows read so far.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Take the read failure that ended iteration early, if any.
    ///
    /// `None` after the iterator returned `None` means the whole table was read.
    pub fn take_error(&mut self) -> Option<TrackError> {
        self.error.take()
    }

    /// Turn the current record into a sample, or `None` if it is invalid.
    fn decode_record(&self) -> Option<LocationSample> {
        let record = &self.record;
        let field = |idx: usize| record.get(idx).filter(|v| !v.is_empty());
        let optional = |idx: Option<usize>| idx.and_then(|i| field(i));

        let timestamp = parse_timestamp(field(self.columns.timestamp)?)?;
        let latitude = parse_coordinate(field(self.columns.latitude)?, 90.0)?;
        let longitude = parse_coordinate(field(self.columns.longitude)?, 180.0)?;
        let individual_local_identifier = field(self.columns.individual_local_identifier)?;

        Some(LocationSample {
            timestamp,
            latitude,
            longitude,
            individual_id: optional(self.columns.individual_id).and_then(|v| v.parse().ok()),
            tag_id: optional(self.columns.tag_id).and_then(|v| v.parse().ok()),
            individual_local_identifier: individual_local_identifier.to_string(),
            taxon_canonical_name: optional(self.columns.taxon_canonical_name)
                .map(str::to_string),
        })
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = LocationSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    // An I/O failure mid-stream ends the table; a bad row is skipped.
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        warn!(
                            context = "read_record",
                            rows_accepted = self.stats.rows_accepted,
                            error = %e,
                            "event table read aborted"
                        );
                        self.error = Some(TrackError::upstream(format!(
                            "event table read failed after {} rows: {e}",
                            self.stats.rows_accepted + self.stats.rows_dropped
                        )));
                        return None;
                    }
                    self.stats.rows_dropped += 1;
                    continue;
                }
            }

            match self.decode_record() {
                Some(sample) => {
                    self.stats.rows_accepted += 1;
                    return Some(sample);
                }
                None => {
                    self.stats.rows_dropped += 1;
                    debug!(
                        line = self.record.position().map(|p| p.line()),
                        "dropping malformed event row"
                    );
                }
            }
        }
    }
}

fn parse_coordinate(value: &str, limit: f64) -> Option<f64> {
    let v: f64 = value.parse().ok()?;
    (v.is_finite() && v.abs() <= limit).then_some(v)
}
