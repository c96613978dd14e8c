// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::error::{Result, StoreError};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Byte-level durable storage addressed by `/`-separated absolute keys.
///
/// `list` returns the direct children of a prefix only, as full keys.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool>;
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Splits a key into its path segments, rejecting anything that could
/// escape the namespace once mapped onto a filesystem.
pub fn key_segments(key: &str) -> Result<Vec<&str>> {
    let rest = key
        .strip_prefix('/')
        .ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;

    let segments: Vec<&str> = rest.split('/').collect();
    for seg in &segments {
        // Dot-prefixed names are reserved for temporary files.
        if seg.is_empty() || seg.starts_with('.') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
    }
    Ok(segments)
}

pub(crate) fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        key_segments(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        key_segments(key)?;
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        key_segments(key)?;
        Ok(self.entries.write().remove(key).is_some())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = normalize_prefix(prefix);
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.clone()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(&prefix))
            .filter(|k| !k[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }
}
