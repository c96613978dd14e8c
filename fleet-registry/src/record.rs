// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use fleet_model::{ContainerBuilder, ContainerReport, ContainerSnapshot, InvalidState};
use fleet_store::{KvHandle, KvMapped};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// What a record persists. Container attributes are not part of it: they
/// are re-learned from the next agent report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_labels: HashMap<String, String>,
}

/// Builder state and its cached projection. Always guarded together.
struct RecordState {
    builder: ContainerBuilder,
    cached: Option<Arc<ContainerSnapshot>>,
}

/// One container's mutable state, owned by the registry.
///
/// All mutation goes through [`modify`](Self::modify); readers only ever see
/// validated snapshots.
pub struct ContainerRecord {
    id: String,
    state: Mutex<RecordState>,
    additional_labels: RwLock<Arc<HashMap<String, String>>>,
    handle: KvHandle,
}

impl ContainerRecord {
    /// # Panics
    ///
    /// If `id` is empty. A record without identity is a caller bug.
    pub fn new(id: &str, handle: KvHandle) -> Self {
        assert!(!id.is_empty(), "container record id is empty");
        Self {
            id: id.to_string(),
            state: Mutex::new(RecordState {
                builder: ContainerBuilder::new(),
                cached: None,
            }),
            additional_labels: RwLock::new(Arc::new(HashMap::new())),
            handle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current snapshot, or `None` while the builder state is invalid.
    ///
    /// Two calls with no mutation in between return the same `Arc`.
    pub fn snapshot(&self) -> Option<Arc<ContainerSnapshot>> {
        let mut state = self.state.lock();
        if let Some(cached) = &state.cached {
            return Some(cached.clone());
        }

        let built = self
            .validate(&state.builder)
            .and_then(|_| state.builder.build());
        match built {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                state.cached = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(reason) => {
                trace!(container = %self.id, %reason, "No valid snapshot");
                None
            }
        }
    }

    /// Last reported node. Does not require a valid snapshot.
    pub fn node(&self) -> Option<String> {
        self.state.lock().builder.node().map(str::to_string)
    }

    /// Applies `modifier` to the builder and validates the result.
    ///
    /// The mutation is kept even when validation fails; the cache is
    /// cleared either way so the next read rebuilds from the new state.
    pub fn modify<F>(&self, modifier: F) -> Result<(), InvalidState>
    where
        F: FnOnce(&mut ContainerBuilder),
    {
        let mut state = self.state.lock();
        modifier(&mut state.builder);
        let result = self.validate(&state.builder);
        state.cached = None;
        result
    }

    pub fn apply_report(&self, report: &ContainerReport, node: &str) -> Result<(), InvalidState> {
        self.modify(|builder| {
            builder.apply_report(report).set_node(node);
        })
    }

    pub fn additional_labels(&self) -> Arc<HashMap<String, String>> {
        self.additional_labels.read().clone()
    }

    pub fn set_additional_labels(&self, labels: HashMap<String, String>) {
        *self.additional_labels.write() = Arc::new(labels);
    }

    /// Writes the persisted document through to storage.
    pub fn flush(&self) -> fleet_store::Result<()> {
        self.handle.write(&self.id, &self.to_document())
    }

    /// `<id> '<name>' of '<image>'`, for log lines.
    pub fn describe(&self) -> String {
        let state = self.state.lock();
        format!(
            "{} '{}' of '{}'",
            self.id,
            state.builder.name(),
            state.builder.image()
        )
    }

    fn validate(&self, builder: &ContainerBuilder) -> Result<(), InvalidState> {
        builder.check_name()?;
        if builder.id() != self.id {
            return Err(InvalidState::IdentityChanged {
                expected: self.id.clone(),
                actual: builder.id().to_string(),
            });
        }
        Ok(())
    }
}

impl KvMapped for ContainerRecord {
    type Document = RecordDocument;

    fn to_document(&self) -> RecordDocument {
        RecordDocument {
            additional_labels: (*self.additional_labels()).clone(),
        }
    }

    fn apply_document(&self, document: RecordDocument) {
        self.set_additional_labels(document.additional_labels);
    }
}

impl std::fmt::Debug for ContainerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRecord")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
