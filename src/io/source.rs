// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Upstream raw-table providers.
//!
//! An [`EventSource`] hands the pipeline one byte stream per request. Both
//! "no data" (`Ok(None)`) and provider failures (`Err`) end the request
//! with empty output; the pipeline never propagates them to the consumer.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::request::EventRequest;
use crate::core::{Result, TrackError};

/// Byte stream of one raw event table.
pub type EventTable = Box<dyn Read + Send>;

/// Provider of raw event tables.
///
/// Implementations own transport concerns such as timeouts and retries.
pub trait EventSource: Send + Sync {
    /// Fetch the raw table for a request.
    ///
    /// Returns `Ok(None)` when the provider has no data for the request.
    fn fetch_event_table(&self, request: &EventRequest) -> Result<Option<EventTable>>;
}

impl<T: EventSource + ?Sized> EventSource for std::sync::Arc<T> {
    fn fetch_event_table(&self, request: &EventRequest) -> Result<Option<EventTable>> {
        (**self).fetch_event_table(request)
    }
}

/// Event source reading `<root>/<study_id>.csv` from disk.
#[derive(Debug, Clone)]
pub struct FileEventSource {
    root: PathBuf,
}

impl FileEventSource {
    /// Create a source rooted at a directory of per-study tables.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the table for a study.
    pub fn table_path(&self, study_id: i64) -> PathBuf {
        self.root.join(format!("{study_id}.csv"))
    }
}

impl EventSource for FileEventSource {
    fn fetch_event_table(&self, request: &EventRequest) -> Result<Option<EventTable>> {
        let path = self.table_path(request.study_id);
        if !path.exists() {
            debug!(path = %path.display(), "no event table for study");
            return Ok(None);
        }
        let file = File::open(&path).map_err(|e| {
            TrackError::upstream(format!("failed to open {}: {e}", path.display()))
        })?;
        Ok(Some(Box::new(BufReader::new(file))))
    }
}

/// Event source serving one in-memory table for every request.
#[derive(Debug, Clone, Default)]
pub struct StaticEventSource {
    table: Option<Vec<u8>>,
}

impl StaticEventSource {
    /// Serve the given table bytes.
    pub fn new(table: impl Into<Vec<u8>>) -> Self {
        Self {
            table: Some(table.into()),
        }
    }

    /// A source that always reports "no data".
    pub fn empty() -> Self {
        Self { table: None }
    }
}

impl EventSource for StaticEventSource {
    fn fetch_event_table(&self, _request: &EventRequest) -> Result<Option<EventTable>> {
        Ok(self
            .table
            .clone()
            .map(|bytes| Box::new(Cursor::new(bytes)) as EventTable))
    }
}
