// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Length-prefixed framing for sequences of encoded chunks.
//!
//! Each frame is `u32 length | payload | u32 crc32(payload)`, little endian.
//! Used to persist a chunk stream to a file or pipe and read it back.

use std::io::{ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::core::{Result, TrackError};

/// Largest payload accepted when reading frames (64 MiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Writes payloads as frames.
pub struct FrameWriter<W: Write> {
    inner: W,
    frames: u64,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, frames: 0 }
    }

    /// Write one payload as a frame.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            TrackError::encode("frame", format!("payload of {} bytes", payload.len()))
        })?;
        self.inner.write_u32::<LittleEndian>(len)?;
        self.inner.write_all(payload)?;
        self.inner
            .write_u32::<LittleEndian>(crc32fast::hash(payload))?;
        self.frames += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Flush and return the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads frames back as payloads.
pub struct FrameReader<R: Read> {
    inner: R,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// Read the next frame, or `None` at a clean end of input.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let len = match self.inner.read_u32::<LittleEndian>() {
            Ok(len) => len as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if len > MAX_FRAME_SIZE {
            return Err(TrackError::parse(
                "frame",
                format!("frame of {len} bytes exceeds limit of {MAX_FRAME_SIZE}"),
            ));
        }

        let mut payload = vec![0u8; len];
        self.inner
            .read_exact(&mut payload)
            .map_err(|e| TrackError::parse("frame", format!("truncated payload: {e}")))?;
        let expected = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| TrackError::parse("frame", format!("truncated checksum: {e}")))?;

        let actual = crc32fast::hash(&payload);
        if actual != expected {
            return Err(TrackError::parse(
                "frame",
                format!("checksum mismatch: expected {expected:#010x}, got {actual:#010x}"),
            ));
        }
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
