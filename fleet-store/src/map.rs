// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::backend::{normalize_prefix, KvBackend};
use crate::error::{Result, StoreError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A value that can live in a [`KvMap`].
///
/// The persisted document may be a strict subset of the value's state;
/// whatever is not in the document is rebuilt at runtime.
pub trait KvMapped: Send + Sync + 'static {
    type Document: Serialize + DeserializeOwned;

    fn to_document(&self) -> Self::Document;
    fn apply_document(&self, document: Self::Document);
}

/// Writer for one key namespace. Cheap to clone; values keep one so they
/// can flush themselves without holding the map.
#[derive(Clone)]
pub struct KvHandle {
    backend: Arc<dyn KvBackend>,
    prefix: String,
}

impl KvHandle {
    pub fn new(backend: Arc<dyn KvBackend>, prefix: &str) -> Self {
        Self {
            backend,
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Ids are opaque; each one is escaped into a single key segment.
    pub fn key_for(&self, id: &str) -> String {
        format!("{}{}", self.prefix, encode_id(id))
    }

    pub fn write<D: Serialize>(&self, id: &str, document: &D) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        self.backend.put(&self.key_for(id), &bytes)
    }

    pub fn read<D: DeserializeOwned>(&self, id: &str) -> Result<Option<D>> {
        match self.backend.get(&self.key_for(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.backend.delete(&self.key_for(id))
    }

    /// Ids (keys relative to the prefix) currently persisted.
    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .list(&self.prefix)?
            .into_iter()
            .filter_map(|key| {
                let segment = key.strip_prefix(&self.prefix)?;
                match urlencoding::decode(segment) {
                    Ok(id) => Some(id.into_owned()),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Skipping undecodable key");
                        None
                    }
                }
            })
            .collect())
    }
}

fn encode_id(id: &str) -> String {
    let encoded = urlencoding::encode(id);
    // A leading dot would collide with temporary files.
    if encoded.starts_with('.') {
        format!("%2E{}", &encoded[1..])
    } else {
        encoded.into_owned()
    }
}

type Factory<T> = Box<dyn Fn(&str) -> T + Send + Sync>;

/// Identity-keyed, persistence-backed index of shared values.
///
/// The index is the source of truth for readers; the backend is written
/// behind it. A failed backend write never rolls the index back.
pub struct KvMap<T: KvMapped> {
    handle: KvHandle,
    entries: DashMap<String, Arc<T>>,
    factory: Factory<T>,
}

impl<T: KvMapped> KvMap<T> {
    /// `factory` builds the value for a key found in storage during [`load`](Self::load).
    pub fn new<F>(handle: KvHandle, factory: F) -> Self
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        Self {
            handle,
            entries: DashMap::new(),
            factory: Box::new(factory),
        }
    }

    pub fn handle(&self) -> &KvHandle {
        &self.handle
    }

    /// Populates the index from storage. Returns how many values were loaded.
    pub fn load(&self) -> Result<usize> {
        let mut loaded = 0;
        for id in self.handle.ids()? {
            let document = match self.handle.read::<T::Document>(&id) {
                Ok(Some(doc)) => doc,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %self.handle.key_for(&id), error = %e, "Skipping unreadable document");
                    continue;
                }
            };

            let value = self
                .entries
                .entry(id.clone())
                .or_insert_with(|| Arc::new((self.factory)(&id)))
                .value()
                .clone();
            value.apply_document(document);
            loaded += 1;
        }

        debug!(prefix = %self.handle.prefix(), loaded, "Loaded documents");
        Ok(loaded)
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the value for `id`, creating it with `create` if absent.
    ///
    /// Creation is atomic per key: concurrent callers racing on a new key all
    /// observe the same value. Storage writes and deletes for a key happen
    /// under that key's index lock, so they land in index order.
    pub fn compute_if_absent<F>(&self, id: &str, create: F) -> Arc<T>
    where
        F: FnOnce(&str) -> T,
    {
        if let Some(existing) = self.get(id) {
            return existing;
        }

        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let value = Arc::new(create(id));
                self.persist(id, &value);
                entry.insert(value.clone());
                value
            }
        }
    }

    /// Removes `id` from storage and the index.
    pub fn remove(&self, id: &str) -> Option<Arc<T>> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                self.forget(id);
                Some(entry.remove())
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Removes `id` only while it still maps to `value` itself, so a value
    /// re-created under the same key is left alone.
    pub fn remove_if_same(&self, id: &str, value: &Arc<T>) -> Option<Arc<T>> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) if Arc::ptr_eq(entry.get(), value) => {
                self.forget(id);
                Some(entry.remove())
            }
            _ => None,
        }
    }

    /// Point-in-time copy of every value; the map may change while the
    /// caller walks it.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forces a durable write of the current document for `id`.
    pub fn flush(&self, id: &str) -> Result<()> {
        let value = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.handle.write(id, &value.to_document())
    }

    fn persist(&self, id: &str, value: &Arc<T>) {
        if let Err(e) = self.handle.write(id, &value.to_document()) {
            error!(key = %self.handle.key_for(id), error = %e, "Failed to persist document");
        }
    }

    fn forget(&self, id: &str) {
        if let Err(e) = self.handle.delete(id) {
            error!(key = %self.handle.key_for(id), error = %e, "Failed to delete document");
        }
    }
}
