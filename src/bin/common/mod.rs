// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;

use movecodec::io::{EventRequest, FileEventSource};
use movecodec::{EventPipeline, PipelineConfig};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Request and source options shared by `stream` and `batch`.
#[derive(Args, Clone, Debug)]
pub struct RequestArgs {
    /// Directory holding one `<study>.csv` table per study
    #[arg(long, value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Study identifier
    #[arg(long, value_name = "ID", required_unless_present = "request")]
    pub study: Option<i64>,

    /// Individual local identifiers (comma separated or repeated)
    #[arg(short, long = "individual", value_delimiter = ',')]
    pub individuals: Vec<String>,

    /// Read the whole request from a JSON file instead
    #[arg(long, value_name = "FILE", conflicts_with_all = ["study", "individuals"])]
    pub request: Option<PathBuf>,

    /// Event profile used in cache keys
    #[arg(long)]
    pub profile: Option<String>,

    /// Keep at most this many samples per individual
    #[arg(long, value_name = "N")]
    pub max_events: Option<u32>,

    /// Drop samples before this time (ms, "YYYY-MM-DD HH:MM:SS" or RFC 3339)
    #[arg(long, value_name = "TIME")]
    pub start: Option<String>,

    /// Drop samples after this time
    #[arg(long, value_name = "TIME")]
    pub end: Option<String>,

    /// Pipeline configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the number of segments per chunk
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,
}

impl RequestArgs {
    /// Assemble the event request from the flags or the request file.
    pub fn to_request(&self) -> Result<EventRequest> {
        let mut request = match &self.request {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                EventRequest::from_json(&text)?
            }
            None => {
                let study = self
                    .study
                    .ok_or_else(|| anyhow::anyhow!("--study is required"))?;
                EventRequest::new(study, self.individuals.iter().cloned())
            }
        };

        if let Some(profile) = &self.profile {
            request = request.with_event_profile(profile.clone());
        }
        if let Some(max) = self.max_events {
            request = request.with_max_events_per_individual(max);
        }
        if self.start.is_some() || self.end.is_some() {
            let start = self.start.as_deref().map(parse_time).transpose()?;
            let end = self.end.as_deref().map(parse_time).transpose()?;
            request = request.with_time_range(start, end);
        }
        Ok(request)
    }

    /// Load the configuration file, if any, and apply overrides.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(size) = self.chunk_size {
            config = config.with_chunk_size(size);
        }
        config.validate()?;
        Ok(config)
    }

    /// Pipeline reading from the data directory, without a cache.
    pub fn pipeline(&self) -> Result<EventPipeline> {
        let source = FileEventSource::new(&self.data_dir);
        Ok(EventPipeline::without_cache(Arc::new(source)).with_config(self.to_config()?))
    }
}

/// Format a duration in milliseconds to human-readable string.
pub fn format_duration(millis: u64) -> String {
    let secs = millis / 1000;
    let rem = millis % 1000;

    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, rem)
    } else {
        format!("{}ms", rem)
    }
}

/// Format a byte count.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

/// Parse a time argument to milliseconds since the Unix epoch.
pub fn parse_time(s: &str) -> CliResult<i64> {
    movecodec::types::parse_timestamp(s).ok_or_else(|| anyhow::anyhow!("Invalid timestamp: {s}"))
}

/// Spinner for progress of open-ended work.
pub struct Spinner {
    inner: Option<indicatif::ProgressBar>,
}

impl Spinner {
    /// Create a spinner; hidden when stderr is not a terminal.
    pub fn new(prefix: impl Into<String>) -> Self {
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {prefix} {msg}")
            {
                pb.set_style(style);
            }
            pb.set_prefix(prefix.into());
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        Self { inner }
    }

    /// Update the message next to the spinner.
    pub fn set_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.set_message(msg);
        }
    }

    /// Finish the spinner with a message.
    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500), "500ms");
        assert_eq!(format_duration(1_500), "1.500s");
        assert_eq!(format_duration(90_000), "1m 30s");
        assert_eq!(format_duration(3_600_000), "1h 0m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("1000").unwrap(), 1000);
        assert_eq!(parse_time("1970-01-01 00:00:01").unwrap(), 1000);
        assert!(parse_time("yesterday").is_err());
    }
}
