// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use thiserror::Error;

/// Reason a container's accumulated attributes cannot be turned into a snapshot.
///
/// This is an expected condition (partial or garbage reports), not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidState {
    #[error("container field '{0}' is missing")]
    MissingField(&'static str),

    /// Some orchestrators report names as `/name`.
    #[error("bad container name: {0}")]
    LeadingSlashName(String),

    #[error("container changed identity: old={expected} new={actual}")]
    IdentityChanged { expected: String, actual: String },
}
