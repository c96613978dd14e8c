// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

pub mod backend;
pub mod error;
pub mod file;
pub mod map;

pub use backend::{KvBackend, MemoryBackend};
pub use error::{Result, StoreError};
pub use file::FileBackend;
pub use map::{KvHandle, KvMap, KvMapped};
