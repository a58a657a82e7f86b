// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Logging setup

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::{fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Returns false when a
/// subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let default = if verbose { "noesis=debug,info" } else { "noesis=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .is_ok()
}
