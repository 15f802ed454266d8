// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use movecodec::core::{Result, TrackError};
use movecodec::encoding::{decode_chunk, BinaryChunkEncoder, ChunkEncoder};
use movecodec::io::{EventRequest, EventSource, EventTable, StaticEventSource};
use movecodec::{CancellationToken, Chunk, ChunkFormat};

// ============================================================================
// Event Tables
// ============================================================================

/// Header row of a Movebank-style event export.
pub const HEADER: &str = "event-id,timestamp,location-long,location-lat,individual-id,tag-id,individual-local-identifier,individual-taxon-canonical-name";

/// One row of a raw event table.
#[derive(Debug, Clone)]
pub struct Row {
    pub individual: String,
    pub timestamp_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Row {
    pub fn new(individual: &str, timestamp_ms: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            individual: individual.to_string(),
            timestamp_ms,
            latitude,
            longitude,
        }
    }
}

/// Builder for CSV event tables.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    rows: Vec<String>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a valid row.
    pub fn row(mut self, row: &Row) -> Self {
        let n = self.rows.len();
        self.rows.push(format!(
            "{},{},{},{},{},{},{},Ciconia ciconia",
            n + 1,
            row.timestamp_ms,
            row.longitude,
            row.latitude,
            100 + n,
            200 + n,
            row.individual
        ));
        self
    }

    /// Append several valid rows.
    pub fn rows<'a>(mut self, rows: impl IntoIterator<Item = &'a Row>) -> Self {
        for row in rows {
            self = self.row(row);
        }
        self
    }

    /// Append a raw line verbatim.
    pub fn raw(mut self, line: &str) -> Self {
        self.rows.push(line.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut table = String::from(HEADER);
        table.push('\n');
        for row in &self.rows {
            table.push_str(row);
            table.push('\n');
        }
        table
    }
}

/// `n` samples for one individual, one minute apart, walking north-east.
pub fn track(individual: &str, n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new(
                individual,
                1_700_000_000_000 + i as i64 * 60_000,
                52.0 + i as f64 * 0.0005,
                5.0 + i as f64 * 0.0005,
            )
        })
        .collect()
}

pub fn table_of(rows: &[Row]) -> String {
    TableBuilder::new().rows(rows).build()
}

// ============================================================================
// Temporary Directories
// ============================================================================

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique temporary directory path for one test.
pub fn temp_dir(prefix: &str) -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    std::env::temp_dir().join(format!(
        "movecodec_{}_{}_{}_{}",
        prefix,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst),
        random
    ))
}

/// Cleanup guard for test temporary files
#[derive(Debug)]
pub struct CleanupGuard(pub PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Create a data directory holding `<study>.csv`.
pub fn data_dir_with(prefix: &str, study_id: i64, table: &str) -> (PathBuf, CleanupGuard) {
    let dir = temp_dir(prefix);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{study_id}.csv")), table).unwrap();
    let guard = CleanupGuard(dir.clone());
    (dir, guard)
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// Collaborator Doubles
// ============================================================================

/// Source counting how often it was asked for data.
pub struct CountingSource {
    inner: StaticEventSource,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn new(table: &str) -> Self {
        Self {
            inner: StaticEventSource::new(table),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EventSource for CountingSource {
    fn fetch_event_table(&self, request: &EventRequest) -> Result<Option<EventTable>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_event_table(request)
    }
}

/// Source whose provider is down.
pub struct FailingSource;

impl EventSource for FailingSource {
    fn fetch_event_table(&self, _request: &EventRequest) -> Result<Option<EventTable>> {
        Err(TrackError::upstream("connection refused"))
    }
}

/// What a [`CutoffSource`] reader does once its row budget is spent.
#[derive(Debug, Clone)]
pub enum Cutoff {
    /// The next read fails with `ConnectionReset`
    Fail,
    /// The token is cancelled as the last budgeted row is handed out
    Cancel(CancellationToken),
}

/// Reader handing out one table line per `read` call.
struct LineReader {
    lines: Vec<Vec<u8>>,
    line: usize,
    offset: usize,
    rows: usize,
    cutoff: Cutoff,
}

impl Read for LineReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        // Line 0 is the header; data row `n` is line `n`.
        if self.line > self.rows {
            if let Cutoff::Fail = self.cutoff {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ));
            }
        }
        let Some(line) = self.lines.get(self.line) else {
            return Ok(0);
        };
        let n = buf.len().min(line.len() - self.offset);
        buf[..n].copy_from_slice(&line[self.offset..self.offset + n]);
        self.offset += n;
        if self.offset == line.len() {
            if self.line == self.rows {
                if let Cutoff::Cancel(token) = &self.cutoff {
                    token.cancel();
                }
            }
            self.line += 1;
            self.offset = 0;
        }
        Ok(n)
    }
}

/// Source whose table stops cooperating after `rows` data rows.
pub struct CutoffSource {
    table: String,
    rows: usize,
    cutoff: Cutoff,
}

impl CutoffSource {
    /// The connection drops after `rows` data rows.
    pub fn failing(table: &str, rows: usize) -> Self {
        Self {
            table: table.to_string(),
            rows,
            cutoff: Cutoff::Fail,
        }
    }

    /// `token` is cancelled while row `rows` is being read.
    pub fn cancelling(table: &str, rows: usize, token: CancellationToken) -> Self {
        Self {
            table: table.to_string(),
            rows,
            cutoff: Cutoff::Cancel(token),
        }
    }
}

impl EventSource for CutoffSource {
    fn fetch_event_table(&self, _request: &EventRequest) -> Result<Option<EventTable>> {
        let lines = self
            .table
            .split_inclusive('\n')
            .map(|l| l.as_bytes().to_vec())
            .collect();
        Ok(Some(Box::new(LineReader {
            lines,
            line: 0,
            offset: 0,
            rows: self.rows,
            cutoff: self.cutoff.clone(),
        })))
    }
}

/// Binary encoder that cancels a token right after its `n`th encode.
pub struct CancellingEncoder {
    inner: BinaryChunkEncoder,
    token: CancellationToken,
    after: usize,
    encoded: AtomicUsize,
}

impl CancellingEncoder {
    pub fn new(token: CancellationToken, after: usize) -> Self {
        Self {
            inner: BinaryChunkEncoder::new(),
            token,
            after,
            encoded: AtomicUsize::new(0),
        }
    }
}

impl ChunkEncoder for CancellingEncoder {
    fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>> {
        let bytes = self.inner.encode(chunk)?;
        if self.encoded.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            self.token.cancel();
        }
        Ok(bytes)
    }

    fn format(&self) -> ChunkFormat {
        ChunkFormat::Binary
    }
}

/// Binary encoder that fails for one individual.
pub struct FailingEncoder {
    inner: BinaryChunkEncoder,
    poison: String,
    seen: Mutex<Vec<String>>,
}

impl FailingEncoder {
    pub fn new(poison: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: BinaryChunkEncoder::new(),
            poison: poison.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Individuals of every chunk handed to the encoder, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ChunkEncoder for FailingEncoder {
    fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>> {
        self.seen
            .lock()
            .unwrap()
            .push(chunk.individual_local_identifier.clone());
        if chunk.individual_local_identifier == self.poison {
            return Err(TrackError::encode("binary", "poisoned individual"));
        }
        self.inner.encode(chunk)
    }

    fn format(&self) -> ChunkFormat {
        ChunkFormat::Binary
    }
}

// ============================================================================
// Assertions
// ============================================================================

/// Decode every binary item of a drained stream.
pub fn decode_all(items: &[Vec<u8>]) -> Vec<Chunk> {
    items.iter().map(|b| decode_chunk(b).unwrap()).collect()
}

/// `(individual, index, count)` per chunk.
pub fn shape(chunks: &[Chunk]) -> Vec<(String, u32, u32)> {
    chunks
        .iter()
        .map(|c| (c.individual_local_identifier.clone(), c.index, c.count))
        .collect()
}
