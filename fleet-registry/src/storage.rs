// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::record::ContainerRecord;
use fleet_model::ContainerReport;
use std::collections::HashSet;
use std::sync::Arc;

/// Query and mutation surface handed to the rest of the cluster manager.
///
/// Callers hold an explicit `Arc<dyn ContainerStorage>`; there is no global
/// instance. A container whose state is invalid is indistinguishable from
/// one that was never reported.
pub trait ContainerStorage: Send + Sync {
    /// Exact lookup. Evicts the record if it has no valid snapshot.
    fn get_container(&self, id: &str) -> Option<Arc<ContainerRecord>>;

    /// Exact id, then id prefix or exact name. Evicts like `get_container`.
    ///
    /// When several records match, which one wins depends on index
    /// iteration order and is not stable.
    fn find_container(&self, name: &str) -> Option<Arc<ContainerRecord>>;

    /// Every record with a valid snapshot. Never evicts.
    fn get_containers(&self) -> Vec<Arc<ContainerRecord>>;

    /// Records last reported from `node`, valid or not.
    fn get_containers_by_node(&self, node: &str) -> Vec<Arc<ContainerRecord>>;

    /// Get-or-create the record for `report.id` and apply the report to it.
    /// Never evicts, even if the report is rejected.
    ///
    /// # Panics
    ///
    /// If `report.id` is empty.
    fn update_and_get_container(&self, report: &ContainerReport, node: &str) -> Arc<ContainerRecord>;

    /// Returns how many records were removed.
    fn remove(&self, ids: &HashSet<String>) -> usize;

    /// Returns how many records were removed.
    fn remove_node_containers(&self, node: &str) -> usize;
}
