// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PREFIX: &str = "/fleet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Root directory of the file backed store.
    pub storage_dir: PathBuf,
    /// Key namespace; records live under `<prefix>/containers/`.
    pub prefix: String,
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self> {
        let storage_dir = match env::var("FLEET_STORAGE_DIR") {
            Ok(p) => PathBuf::from(p),
            Err(_) => default_storage_dir(),
        };

        let prefix = env::var("FLEET_KV_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
        if !prefix.starts_with('/') {
            bail!("FLEET_KV_PREFIX must be an absolute key path, got '{}'", prefix);
        }

        Ok(Self {
            storage_dir,
            prefix,
        })
    }

    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join(".fleet/registry")
}
