// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Cache collaborator interface.
//!
//! The streaming transport hands each completed individual's chunk list to an
//! [`IndividualCache`]. Storage, eviction and TTL belong to the
//! implementation; the pipeline only writes and never awaits more than the
//! call itself.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::core::{Result, TrackError};
use crate::types::Chunk;

/// Composite cache key for one individual's chunk set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Study the individual belongs to
    pub study_id: i64,
    /// Study-local individual name
    pub individual_local_identifier: String,
    /// Event profile from the request options (empty when none)
    pub event_profile: String,
}

impl CacheKey {
    /// Create a cache key.
    pub fn new(
        study_id: i64,
        individual_local_identifier: impl Into<String>,
        event_profile: impl Into<String>,
    ) -> Self {
        Self {
            study_id,
            individual_local_identifier: individual_local_identifier.into(),
            event_profile: event_profile.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.study_id, self.individual_local_identifier, self.event_profile
        )
    }
}

/// Write side of the individual cache.
pub trait IndividualCache: Send + Sync {
    /// Store the full ordered chunk list of one individual.
    fn add_individual(&self, key: &CacheKey, chunks: Vec<Chunk>) -> Result<()>;
}

impl<T: IndividualCache + ?Sized> IndividualCache for std::sync::Arc<T> {
    fn add_individual(&self, key: &CacheKey, chunks: Vec<Chunk>) -> Result<()> {
        (**self).add_individual(key, chunks)
    }
}

/// Cache that discards every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl IndividualCache for NoopCache {
    fn add_individual(&self, _key: &CacheKey, _chunks: Vec<Chunk>) -> Result<()> {
        Ok(())
    }
}

/// In-process cache keeping the latest chunk set per key.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Vec<Chunk>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, Vec<Chunk>>>> {
        self.entries
            .lock()
            .map_err(|_| TrackError::cache("memory cache lock poisoned"))
    }

    /// Get a copy of the chunk set stored for a key.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<Chunk>> {
        self.lock().ok()?.get(key).cloned()
    }

    /// Number of cached individuals.
    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl IndividualCache for MemoryCache {
    fn add_individual(&self, key: &CacheKey, chunks: Vec<Chunk>) -> Result<()> {
        self.lock()?.insert(key.clone(), chunks);
        Ok(())
    }
}
