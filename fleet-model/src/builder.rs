// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::error::InvalidState;
use crate::report::{ContainerReport, ContainerState, Port};
use crate::snapshot::ContainerSnapshot;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Mutable accumulator for container attributes.
///
/// Reports may arrive partially filled; the builder keeps whatever it was
/// given and only complains when asked to [`build`](Self::build).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerBuilder {
    id: String,
    name: String,
    image: String,
    image_id: Option<String>,
    command: Option<String>,
    labels: BTreeMap<String, String>,
    ports: Vec<Port>,
    status: Option<String>,
    state: ContainerState,
    created: Option<DateTime<Utc>>,
    node: Option<String>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every attribute of `report` into the builder. The node is left untouched.
    pub fn apply_report(&mut self, report: &ContainerReport) -> &mut Self {
        self.id = report.id.clone();
        self.name = report.name.clone();
        self.image = report.image.clone();
        self.image_id = report.image_id.clone();
        self.command = report.command.clone();
        self.labels = report.labels.clone();
        self.ports = report.ports.clone();
        self.status = report.status.clone();
        self.state = report.state;
        self.created = report.created;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_image(&mut self, image: impl Into<String>) -> &mut Self {
        self.image = image.into();
        self
    }

    pub fn set_node(&mut self, node: impl Into<String>) -> &mut Self {
        self.node = Some(node.into());
        self
    }

    pub fn set_state(&mut self, state: ContainerState) -> &mut Self {
        self.state = state;
        self
    }

    pub fn set_status(&mut self, status: Option<String>) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_labels(&mut self, labels: BTreeMap<String, String>) -> &mut Self {
        self.labels = labels;
        self
    }

    /// Checks the name shape shared by every build and by record mutations.
    pub fn check_name(&self) -> Result<(), InvalidState> {
        if self.name.starts_with('/') {
            return Err(InvalidState::LeadingSlashName(self.name.clone()));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<ContainerSnapshot, InvalidState> {
        if self.id.is_empty() {
            return Err(InvalidState::MissingField("id"));
        }
        if self.name.is_empty() {
            return Err(InvalidState::MissingField("name"));
        }
        if self.image.is_empty() {
            return Err(InvalidState::MissingField("image"));
        }
        self.check_name()?;

        Ok(ContainerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            image_id: self.image_id.clone(),
            command: self.command.clone(),
            labels: self.labels.clone(),
            ports: self.ports.clone(),
            status: self.status.clone(),
            state: self.state,
            created: self.created,
            node: self.node.clone(),
        })
    }
}
