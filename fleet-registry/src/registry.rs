// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::config::RegistryConfig;
use crate::record::ContainerRecord;
use crate::storage::ContainerStorage;
use anyhow::{Context, Result};
use fleet_model::ContainerReport;
use fleet_store::{FileBackend, KvBackend, KvHandle, KvMap};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

const CONTAINERS_PATH: &str = "containers";

/// Identity-keyed index of every container in the fleet.
///
/// Point lookups evict records that fail to produce a snapshot; bulk
/// listing only filters them out.
pub struct ContainerRegistry {
    records: KvMap<ContainerRecord>,
}

impl ContainerRegistry {
    pub fn new(backend: Arc<dyn KvBackend>, prefix: &str) -> Self {
        let path = format!("{}/{}/", prefix.trim_end_matches('/'), CONTAINERS_PATH);
        let handle = KvHandle::new(backend, &path);

        let factory_handle = handle.clone();
        let records = KvMap::new(handle, move |id| {
            ContainerRecord::new(id, factory_handle.clone())
        });
        Self { records }
    }

    /// File backed registry, loaded and ready to serve.
    pub fn open(config: &RegistryConfig) -> Result<Self> {
        let backend = FileBackend::open(&config.storage_dir).with_context(|| {
            format!(
                "Failed to open container store at {}",
                config.storage_dir.display()
            )
        })?;

        let registry = Self::new(Arc::new(backend), &config.prefix);
        registry.load().context("Failed to load container records")?;
        Ok(registry)
    }

    /// Creates one record per persisted key. Loaded records stay invalid
    /// until their container is reported again.
    pub fn load(&self) -> fleet_store::Result<usize> {
        let loaded = self.records.load()?;
        info!(loaded, prefix = %self.records.handle().prefix(), "Container records loaded");
        Ok(loaded)
    }

    /// Whether `id` is indexed, valid or not.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Indexed records, valid or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn node_container_ids(&self, node: &str) -> HashSet<String> {
        self.containers_by_node(node)
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn remove_container(&self, id: &str) -> Option<Arc<ContainerRecord>> {
        let removed = self.records.remove(id)?;
        info!(container = %removed.describe(), "Container removed");
        Some(removed)
    }

    fn containers_by_node<'a>(
        &self,
        node: &'a str,
    ) -> impl Iterator<Item = Arc<ContainerRecord>> + 'a {
        self.records
            .values()
            .into_iter()
            .filter(move |r| r.node().as_deref() == Some(node))
    }

    /// Passes valid records through; evicts the rest.
    fn check(&self, record: Arc<ContainerRecord>) -> Option<Arc<ContainerRecord>> {
        if record.snapshot().is_some() {
            return Some(record);
        }

        if let Some(evicted) = self.records.remove_if_same(record.id(), &record) {
            info!(container = %evicted.describe(), reason = "invalid", "Container removed");
        }
        None
    }
}

impl ContainerStorage for ContainerRegistry {
    fn get_container(&self, id: &str) -> Option<Arc<ContainerRecord>> {
        let record = self.records.get(id)?;
        self.check(record)
    }

    fn find_container(&self, name: &str) -> Option<Arc<ContainerRecord>> {
        let record = self.records.get(name).or_else(|| {
            self.records.values().into_iter().find(|r| match r.snapshot() {
                Some(snapshot) => r.id().starts_with(name) || snapshot.name() == name,
                None => false,
            })
        })?;
        self.check(record)
    }

    fn get_containers(&self) -> Vec<Arc<ContainerRecord>> {
        self.records
            .values()
            .into_iter()
            .filter(|r| r.snapshot().is_some())
            .collect()
    }

    fn get_containers_by_node(&self, node: &str) -> Vec<Arc<ContainerRecord>> {
        self.containers_by_node(node).collect()
    }

    fn update_and_get_container(&self, report: &ContainerReport, node: &str) -> Arc<ContainerRecord> {
        let handle = self.records.handle().clone();
        let record = self
            .records
            .compute_if_absent(&report.id, |id| ContainerRecord::new(id, handle));

        match record.apply_report(report, node) {
            Ok(()) => info!(container = %record.describe(), node, "Container updated"),
            Err(reason) => warn!(container = %record.id(), node, %reason, "Container report rejected"),
        }
        record
    }

    fn remove(&self, ids: &HashSet<String>) -> usize {
        ids.iter()
            .filter(|id| self.remove_container(id).is_some())
            .count()
    }

    fn remove_node_containers(&self, node: &str) -> usize {
        let ids = self.node_container_ids(node);
        let removed = self.remove(&ids);
        info!(node, removed, "Node containers removed");
        removed
    }
}

impl std::fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("prefix", &self.records.handle().prefix())
            .field("records", &self.records.len())
            .finish()
    }
}
