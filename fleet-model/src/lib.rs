// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

pub mod builder;
pub mod error;
pub mod report;
pub mod snapshot;

pub use builder::ContainerBuilder;
pub use error::InvalidState;
pub use report::{ContainerReport, ContainerState, Port, PortProtocol};
pub use snapshot::ContainerSnapshot;
