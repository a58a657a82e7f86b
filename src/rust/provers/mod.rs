// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prover capabilities
//!
//! Every prover the router can dispatch to, native or external, sits
//! behind the `ProverCapability` trait. The router only ever holds
//! `Arc<dyn ProverCapability>` handles from a `ProverRegistry`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::core::Formula;
use crate::inference::CancellationFlag;
use crate::proof::ProofResult;

pub mod native;

pub use native::NativeProver;

/// Features a prover supports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverCapabilities {
    pub supports_quantifiers: bool,
    pub supports_arithmetic: bool,
    pub supports_modal: bool,
    pub supports_temporal: bool,
    pub supports_deontic: bool,

    /// Results carry proof steps
    pub produces_proof_steps: bool,

    /// Interactive theorem prover rather than an automatic solver
    pub interactive: bool,

    /// Typical time to answer, used for fastest-first ordering
    pub typical_latency_ms: u64,
}

impl ProverCapabilities {
    /// Number of supported logical features, used for most-capable ordering
    pub fn feature_count(&self) -> usize {
        [
            self.supports_quantifiers,
            self.supports_arithmetic,
            self.supports_modal,
            self.supports_temporal,
            self.supports_deontic,
        ]
        .iter()
        .filter(|supported| **supported)
        .count()
    }
}

/// Universal trait for provers
#[async_trait]
pub trait ProverCapability: Send + Sync {
    /// Stable identity used in results, cache keys and the analyzer's table
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn capabilities(&self) -> ProverCapabilities;

    /// Settings that change results; part of the cache key
    fn config_fingerprint(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Attempt to prove `goal` from `axioms` within `timeout`.
    ///
    /// `Err` means the prover failed structurally (crashed, could not be
    /// reached); proof outcomes, including failure to find a proof, are
    /// `Ok` results.
    async fn prove(&self, goal: &Formula, axioms: &[Formula], timeout: Duration) -> anyhow::Result<ProofResult>;

    /// Like `prove`, checking `cancel` at safe points where supported
    async fn prove_cancellable(
        &self,
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
        _cancel: CancellationFlag,
    ) -> anyhow::Result<ProofResult> {
        self.prove(goal, axioms, timeout).await
    }
}

/// Named prover handles in registration order
#[derive(Clone, Default)]
pub struct ProverRegistry {
    provers: Vec<Arc<dyn ProverCapability>>,
}

impl ProverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the native engine
    pub fn with_native(prover: NativeProver) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(prover));
        registry
    }

    /// Add a prover, replacing any prover registered under the same name
    pub fn register(&mut self, prover: Arc<dyn ProverCapability>) {
        match self.provers.iter().position(|p| p.name() == prover.name()) {
            Some(index) => self.provers[index] = prover,
            None => self.provers.push(prover),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProverCapability>> {
        self.provers.iter().find(|p| p.name() == name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProverCapability>> {
        self.provers.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.provers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Registration index, used as a tie-breaker
    pub fn position(&self, name: &str) -> Option<usize> {
        self.provers.iter().position(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.provers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provers.is_empty()
    }
}

impl std::fmt::Debug for ProverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProverRegistry").field("provers", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_feature_count() {
        let caps = ProverCapabilities {
            supports_quantifiers: true,
            supports_modal: true,
            ..ProverCapabilities::default()
        };
        assert_eq!(caps.feature_count(), 2);
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = ProverRegistry::with_native(NativeProver::new(EngineConfig::default()));
        registry.register(Arc::new(NativeProver::new(EngineConfig { max_steps: 5, ..EngineConfig::default() })));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["native".to_string()]);
        assert_eq!(registry.position("native"), Some(0));
        assert!(registry.get("z3").is_none());
    }
}
