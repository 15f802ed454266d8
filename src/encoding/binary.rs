// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Compact binary chunk encoding.
//!
//! A chunk is written as four positional fields, little endian:
//!
//! ```text
//! u8   field count (= 4)
//! [0]  u32 segment count N, then N segments:
//!        f64 source lon, f64 source lat, f64 target lon, f64 target lat,
//!        str content, i64 source ts, i64 destination ts,
//!        f64 segment km, f64 cumulative km
//! [1]  str individual identifier
//! [2]  u32 count
//! [3]  u32 index
//!
//! str = u32 byte length + UTF-8 bytes
//! ```

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::ChunkEncoder;
use crate::core::{ChunkFormat, Result, TrackError};
use crate::types::{Chunk, Point, Segment};

/// Number of positional fields in an encoded chunk.
pub const CHUNK_FIELD_COUNT: u8 = 4;

/// Fixed bytes per segment, excluding the content string bytes.
const SEGMENT_FIXED_SIZE: usize = 4 * 8 + 4 + 2 * 8 + 2 * 8;

/// Binary chunk encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryChunkEncoder;

impl BinaryChunkEncoder {
    /// Create a new binary encoder.
    pub fn new() -> Self {
        Self
    }
}

impl ChunkEncoder for BinaryChunkEncoder {
    fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>> {
        encode_chunk(chunk)
    }

    fn format(&self) -> ChunkFormat {
        ChunkFormat::Binary
    }
}

/// Encode a chunk into the binary layout.
///
/// # Errors
///
/// Fails if `count` disagrees with the segment list or a length does not
/// fit in `u32`.
pub fn encode_chunk(chunk: &Chunk) -> Result<Vec<u8>> {
    let segment_count = len_u32(chunk.segments.len(), "segment list")?;
    if chunk.count != segment_count {
        return Err(TrackError::encode(
            "binary",
            format!(
                "chunk {} of '{}' declares {} segments but holds {}",
                chunk.index, chunk.individual_local_identifier, chunk.count, segment_count
            ),
        ));
    }

    let content_bytes: usize = chunk.segments.iter().map(|s| s.content.len()).sum();
    let mut buf = Vec::with_capacity(
        1 + 4
            + chunk.segments.len() * SEGMENT_FIXED_SIZE
            + content_bytes
            + 4
            + chunk.individual_local_identifier.len()
            + 8,
    );

    buf.push(CHUNK_FIELD_COUNT);

    // [0] segments
    buf.write_u32::<LittleEndian>(segment_count)?;
    for segment in &chunk.segments {
        write_segment(&mut buf, segment)?;
    }

    // [1] identifier
    write_str(&mut buf, &chunk.individual_local_identifier)?;

    // [2] count, [3] index
    buf.write_u32::<LittleEndian>(chunk.count)?;
    buf.write_u32::<LittleEndian>(chunk.index)?;

    Ok(buf)
}

/// Decode a chunk from the binary layout.
///
/// # Errors
///
/// Fails on truncated input, out-of-bounds length prefixes, invalid UTF-8,
/// an unexpected field count or trailing bytes.
pub fn decode_chunk(data: &[u8]) -> Result<Chunk> {
    let mut cursor = ChunkCursor::new(data);

    let fields = cursor.read_u8()?;
    if fields != CHUNK_FIELD_COUNT {
        return Err(TrackError::parse(
            "binary chunk",
            format!("expected {CHUNK_FIELD_COUNT} fields, found {fields}"),
        ));
    }

    let segment_count = cursor.read_u32()? as usize;
    // Each segment needs at least its fixed part; reject absurd counts early.
    let min_bytes = segment_count.saturating_mul(SEGMENT_FIXED_SIZE);
    if min_bytes > cursor.remaining() {
        return Err(TrackError::length_exceeded(
            segment_count,
            cursor.position(),
            data.len(),
        ));
    }

    let mut segments = Vec::with_capacity(segment_count);
    for _ in 0..segment_count {
        segments.push(read_segment(&mut cursor)?);
    }

    let individual_local_identifier = cursor.read_str()?;
    let count = cursor.read_u32()?;
    let index = cursor.read_u32()?;

    if cursor.remaining() != 0 {
        return Err(TrackError::parse(
            "binary chunk",
            format!("{} trailing bytes", cursor.remaining()),
        ));
    }

    Ok(Chunk {
        individual_local_identifier,
        segments,
        count,
        index,
    })
}

fn write_segment(buf: &mut Vec<u8>, segment: &Segment) -> Result<()> {
    buf.write_f64::<LittleEndian>(segment.source.longitude)?;
    buf.write_f64::<LittleEndian>(segment.source.latitude)?;
    buf.write_f64::<LittleEndian>(segment.target.longitude)?;
    buf.write_f64::<LittleEndian>(segment.target.latitude)?;
    write_str(buf, &segment.content)?;
    buf.write_i64::<LittleEndian>(segment.source_timestamp)?;
    buf.write_i64::<LittleEndian>(segment.destination_timestamp)?;
    buf.write_f64::<LittleEndian>(segment.distance_km)?;
    buf.write_f64::<LittleEndian>(segment.cumulative_distance_km)?;
    Ok(())
}

fn read_segment(cursor: &mut ChunkCursor<'_>) -> Result<Segment> {
    let source = Point::new(cursor.read_f64()?, cursor.read_f64()?);
    let target = Point::new(cursor.read_f64()?, cursor.read_f64()?);
    let content = cursor.read_str()?;
    Ok(Segment {
        source,
        target,
        content,
        source_timestamp: cursor.read_i64()?,
        destination_timestamp: cursor.read_i64()?,
        distance_km: cursor.read_f64()?,
        cumulative_distance_km: cursor.read_f64()?,
    })
}

fn write_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    buf.write_u32::<LittleEndian>(len_u32(s.len(), "string")?)?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn len_u32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| TrackError::encode("binary", format!("{what} length {len} exceeds u32")))
}

/// Bounds-checked little-endian reader over an encoded chunk.
struct ChunkCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ChunkCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn position(&self) -> usize {
        self.offset
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(TrackError::buffer_too_short(
                n,
                self.remaining(),
                self.offset,
            ));
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    fn read_str(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        if len > self.remaining() {
            return Err(TrackError::length_exceeded(
                len,
                self.offset,
                self.data.len(),
            ));
        }
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| TrackError::parse("binary chunk string", e.to_string()))
    }
}
