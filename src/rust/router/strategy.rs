// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the router spends its candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Top-ranked available candidate only
    #[default]
    Auto,
    /// Ranked order, falling through until a decisive result
    Sequential,
    /// All candidates race under a shared deadline
    Parallel,
    /// Sequential, lowest typical latency first
    Fastest,
    /// Sequential, most supported features first
    MostCapable,
}

impl SelectionStrategy {
    pub fn all() -> [SelectionStrategy; 5] {
        [
            SelectionStrategy::Auto,
            SelectionStrategy::Sequential,
            SelectionStrategy::Parallel,
            SelectionStrategy::Fastest,
            SelectionStrategy::MostCapable,
        ]
    }
}

impl FromStr for SelectionStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "auto" => Ok(SelectionStrategy::Auto),
            "sequential" => Ok(SelectionStrategy::Sequential),
            "parallel" => Ok(SelectionStrategy::Parallel),
            "fastest" => Ok(SelectionStrategy::Fastest),
            "mostcapable" => Ok(SelectionStrategy::MostCapable),
            _ => Err(anyhow::anyhow!("Unknown strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
