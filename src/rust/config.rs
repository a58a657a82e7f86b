// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for every component
//!
//! All sections deserialize with defaults for missing fields, so a JSON
//! file only needs to name what it overrides. Durations are milliseconds.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::analyzer::AnalyzerConfig;
use crate::error::ConfigError;
use crate::inference::modal::ModalLogic;
use crate::router::strategy::SelectionStrategy;

/// Parser limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting depth accepted before `MaxDepthExceeded`
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { max_depth: 256 }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("parser.max_depth must be positive".to_string()));
        }
        Ok(())
    }
}

/// Native inference engine budgets and modal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum rule applications (and tableau expansions) per proof
    pub max_steps: usize,

    /// Wall-clock budget per proof
    pub time_budget_ms: u64,

    /// Maximum derived facts before giving up
    pub max_facts: usize,

    /// Formulas deeper than this are rejected with `DepthExceeded`
    pub max_formula_depth: usize,

    /// Possible worlds per tableau branch
    pub max_worlds: usize,

    /// Open branches kept on the tableau stack
    pub max_branches: usize,

    /// Force a modal logic instead of consulting the selection table
    pub modal_logic: Option<ModalLogic>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_steps: 1_000,
            time_budget_ms: 5_000,
            max_facts: 10_000,
            max_formula_depth: 256,
            max_worlds: 64,
            max_branches: 1_024,
            modal_logic: None,
        }
    }
}

impl EngineConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("engine.max_steps must be positive".to_string()));
        }
        if self.time_budget_ms == 0 {
            return Err(ConfigError::Invalid("engine.time_budget_ms must be positive".to_string()));
        }
        if self.max_facts == 0 || self.max_formula_depth == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_facts and engine.max_formula_depth must be positive".to_string(),
            ));
        }
        if self.max_worlds == 0 || self.max_branches == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_worlds and engine.max_branches must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Proof cache sizing and expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries kept before least-recently-used eviction
    pub max_entries: usize,

    /// Default time-to-live for stored results
    pub ttl_ms: u64,

    /// Disabled caches miss on every lookup and store nothing
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_entries: 1_024,
            ttl_ms: 60 * 60 * 1_000, // 1 hour
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid("cache.max_entries must be positive".to_string()));
        }
        if self.ttl_ms == 0 {
            return Err(ConfigError::Invalid("cache.ttl_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Router defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Overall deadline used when the caller does not pass one
    pub default_timeout_ms: u64,

    /// Strategy used by `prove_default`
    pub default_strategy: SelectionStrategy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            default_timeout_ms: 30_000,
            default_strategy: SelectionStrategy::Auto,
        }
    }
}

impl RouterConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::Invalid("router.default_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub parser: ParserConfig,
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub analyzer: AnalyzerConfig,
    pub router: RouterConfig,
}

impl CoreConfig {
    /// Decode and validate JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, decode and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()?;
        self.engine.validate()?;
        self.cache.validate()?;
        self.analyzer.validate()?;
        self.router.validate()
    }
}
