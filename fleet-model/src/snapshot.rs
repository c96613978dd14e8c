// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::report::{ContainerState, Port};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Immutable, validated view of a container at one point in time.
///
/// Only [`ContainerBuilder::build`](crate::ContainerBuilder::build) creates these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSnapshot {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) image: String,
    pub(crate) image_id: Option<String>,
    pub(crate) command: Option<String>,
    pub(crate) labels: BTreeMap<String, String>,
    pub(crate) ports: Vec<Port>,
    pub(crate) status: Option<String>,
    pub(crate) state: ContainerState,
    pub(crate) created: Option<DateTime<Utc>>,
    pub(crate) node: Option<String>,
}

impl ContainerSnapshot {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Node the container was last reported from.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }
}
