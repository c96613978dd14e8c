// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the JSON subscriber used by processes embedding the registry.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(component: &str) {
    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .json(),
        )
        .try_init();

    if installed.is_err() {
        debug!(component, "Global subscriber already installed");
        return;
    }

    info!(
        component = component,
        version = env!("CARGO_PKG_VERSION"),
        "Registry logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("fleet-registry-test");
        init_logging("fleet-registry-test");
        info!("still logging");
    }
}
