// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Native prover backend
//!
//! Wraps the in-process inference engine. The engine is synchronous, so
//! each proof runs on the blocking pool with its wall-clock budget capped
//! by the caller's timeout.

use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{ProverCapabilities, ProverCapability};
use crate::config::EngineConfig;
use crate::core::Formula;
use crate::inference::{CancellationFlag, InferenceEngine};
use crate::proof::ProofResult;

/// Name the native engine reports in results
pub const NATIVE_PROVER: &str = "native";

/// In-process forward-chaining and tableau prover
#[derive(Debug, Clone, Default)]
pub struct NativeProver {
    config: EngineConfig,
}

impl NativeProver {
    pub fn new(config: EngineConfig) -> Self {
        NativeProver { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[async_trait]
impl ProverCapability for NativeProver {
    fn name(&self) -> &str {
        NATIVE_PROVER
    }

    fn is_available(&self) -> bool {
        true
    }

    fn capabilities(&self) -> ProverCapabilities {
        ProverCapabilities {
            supports_quantifiers: true,
            supports_arithmetic: false,
            supports_modal: true,
            supports_temporal: true,
            supports_deontic: true,
            produces_proof_steps: true,
            interactive: false,
            typical_latency_ms: 1,
        }
    }

    fn config_fingerprint(&self) -> BTreeMap<String, String> {
        let config = &self.config;
        let mut fingerprint = BTreeMap::new();
        fingerprint.insert("max_steps".to_string(), config.max_steps.to_string());
        fingerprint.insert("max_facts".to_string(), config.max_facts.to_string());
        fingerprint.insert("max_formula_depth".to_string(), config.max_formula_depth.to_string());
        fingerprint.insert("max_worlds".to_string(), config.max_worlds.to_string());
        fingerprint.insert("max_branches".to_string(), config.max_branches.to_string());
        fingerprint.insert(
            "modal_logic".to_string(),
            config.modal_logic.map(|l| l.to_string()).unwrap_or_else(|| "auto".to_string()),
        );
        fingerprint
    }

    async fn prove(&self, goal: &Formula, axioms: &[Formula], timeout: Duration) -> anyhow::Result<ProofResult> {
        self.prove_cancellable(goal, axioms, timeout, CancellationFlag::new()).await
    }

    async fn prove_cancellable(
        &self,
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
        cancel: CancellationFlag,
    ) -> anyhow::Result<ProofResult> {
        let config = self.config.clone();
        let goal = goal.clone();
        let axioms = axioms.to_vec();

        debug!("Native prover starting on {} with {} axioms", goal, axioms.len());
        tokio::task::spawn_blocking(move || {
            let engine = InferenceEngine::new(config).with_cancellation(cancel);
            let budget = engine.default_budget().capped(timeout);
            engine.prove(&goal, &axioms, budget)
        })
        .await
        .context("Native prover task failed")
    }
}
