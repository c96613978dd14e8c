// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

//! Authoritative registry of the containers running across the fleet.
//!
//! Node agents report what they observe through
//! [`ContainerStorage::update_and_get_container`]; schedulers and operators
//! read through the query half of the same trait.

pub mod config;
pub mod logging;
pub mod record;
pub mod registry;
pub mod storage;

pub use config::RegistryConfig;
pub use logging::init_logging;
pub use record::{ContainerRecord, RecordDocument};
pub use registry::ContainerRegistry;
pub use storage::ContainerStorage;

pub use fleet_model::{ContainerReport, ContainerSnapshot, ContainerState, InvalidState};
