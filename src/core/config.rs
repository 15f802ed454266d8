// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries the tunables shared by both transports. It can be
//! built in code with the `with_*` methods or loaded from a TOML file:
//!
//! ```toml
//! chunk_size = 1000
//! channel_capacity = 32
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Result, TrackError};

/// Maximum number of segments in one chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default capacity of the bounded channel between producer and consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Configuration for the streaming and batch transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Segments per full chunk
    pub chunk_size: usize,
    /// Encoded chunks buffered ahead of the consumer (backpressure bound)
    pub channel_capacity: usize,
    /// Name given to the producer thread
    pub thread_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            thread_name: "movecodec-stream".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Set the number of segments per full chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the bounded channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the producer thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| TrackError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(TrackError::config("chunk_size must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(TrackError::config("channel_capacity must be at least 1"));
        }
        Ok(())
    }
}
