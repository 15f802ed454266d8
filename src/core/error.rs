// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for movecodec.
//!
//! Covers the failure classes of the event pipeline:
//! - Raw table and request parsing
//! - Binary chunk decoding (bounds checks)
//! - Chunk encoding
//! - Upstream provider and cache collaborator faults

use thiserror::Error;

/// Errors that can occur while fetching, decoding, chunking or encoding events.
#[derive(Debug, Clone, Error)]
pub enum TrackError {
    /// Parse error in a record, request or timestamp
    #[error("Parse error in {context}: {message}")]
    Parse {
        /// What was being parsed
        context: String,
        /// Error message
        message: String,
    },

    /// Buffer too short for requested read
    #[error("Buffer too short: requested {requested} bytes at position {position}, but only {available} bytes available")]
    BufferTooShort {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Read position when the error occurred
        position: usize,
    },

    /// A length prefix points past the end of the buffer
    #[error("Length {length} exceeds buffer at position {position} (buffer length: {buffer_len})")]
    LengthExceeded {
        /// Length that was read
        length: usize,
        /// Position in buffer
        position: usize,
        /// Buffer length
        buffer_len: usize,
    },

    /// A chunk could not be serialized
    #[error("{codec} encode error: {message}")]
    Encode {
        /// Codec context (e.g., "binary", "json", "frame")
        codec: String,
        /// Error message
        message: String,
    },

    /// The upstream raw-table provider failed
    #[error("Upstream unavailable: {message}")]
    Upstream {
        /// Error message
        message: String,
    },

    /// The cache collaborator rejected a write
    #[error("Cache write failed: {message}")]
    Cache {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl TrackError {
    /// Create a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        TrackError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a buffer too short error.
    pub fn buffer_too_short(requested: usize, available: usize, position: usize) -> Self {
        TrackError::BufferTooShort {
            requested,
            available,
            position,
        }
    }

    /// Create a length exceeded error.
    pub fn length_exceeded(length: usize, position: usize, buffer_len: usize) -> Self {
        TrackError::LengthExceeded {
            length,
            position,
            buffer_len,
        }
    }

    /// Create an encode error.
    pub fn encode(codec: impl Into<String>, message: impl Into<String>) -> Self {
        TrackError::Encode {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Create an upstream error.
    pub fn upstream(message: impl Into<String>) -> Self {
        TrackError::Upstream {
            message: message.into(),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        TrackError::Cache {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        TrackError::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from chunk encoding.
    pub fn is_encode(&self) -> bool {
        matches!(self, TrackError::Encode { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            TrackError::Parse { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            TrackError::BufferTooShort {
                requested,
                available,
                position,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("position", position.to_string()),
            ],
            TrackError::LengthExceeded {
                length,
                position,
                buffer_len,
            } => vec![
                ("length", length.to_string()),
                ("position", position.to_string()),
                ("buffer_len", buffer_len.to_string()),
            ],
            TrackError::Encode { codec, message } => {
                vec![("codec", codec.clone()), ("message", message.clone())]
            }
            TrackError::Upstream { message }
            | TrackError::Cache { message }
            | TrackError::Config { message } => vec![("message", message.clone())],
            TrackError::Io(msg) | TrackError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl From<std::io::Error> for TrackError {
    fn from(err: std::io::Error) -> Self {
        TrackError::Io(err.to_string())
    }
}

impl From<csv::Error> for TrackError {
    fn from(err: csv::Error) -> Self {
        TrackError::parse("csv", err.to_string())
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        TrackError::parse("json", err.to_string())
    }
}

/// Result type for movecodec operations.
pub type Result<T> = std::result::Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = TrackError::parse("timestamp", "bad value");
        assert!(matches!(err, TrackError::Parse { .. }));
        assert_eq!(err.to_string(), "Parse error in timestamp: bad value");
    }

    #[test]
    fn test_buffer_too_short_error() {
        let err = TrackError::buffer_too_short(8, 3, 12);
        assert_eq!(
            err.to_string(),
            "Buffer too short: requested 8 bytes at position 12, but only 3 bytes available"
        );
    }

    #[test]
    fn test_length_exceeded_error() {
        let err = TrackError::length_exceeded(1000, 500, 800);
        assert_eq!(
            err.to_string(),
            "Length 1000 exceeds buffer at position 500 (buffer length: 800)"
        );
    }

    #[test]
    fn test_encode_error() {
        let err = TrackError::encode("binary", "count mismatch");
        assert!(err.is_encode());
        assert_eq!(err.to_string(), "binary encode error: count mismatch");
    }

    #[test]
    fn test_collaborator_errors() {
        assert_eq!(
            TrackError::upstream("timeout").to_string(),
            "Upstream unavailable: timeout"
        );
        assert_eq!(
            TrackError::cache("full").to_string(),
            "Cache write failed: full"
        );
    }

    #[test]
    fn test_log_fields_buffer_too_short() {
        let fields = TrackError::buffer_too_short(100, 50, 10).log_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], ("requested", "100".to_string()));
        assert_eq!(fields[1], ("available", "50".to_string()));
        assert_eq!(fields[2], ("position", "10".to_string()));
    }

    #[test]
    fn test_log_fields_encode() {
        let fields = TrackError::encode("json", "oops").log_fields();
        assert_eq!(fields[0], ("codec", "json".to_string()));
        assert_eq!(fields[1], ("message", "oops".to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TrackError = io_err.into();
        assert!(matches!(err, TrackError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: file not found");
    }
}
