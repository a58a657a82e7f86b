// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mock prover capability for testing

use async_trait::async_trait;
use noesis::{Formula, ProofResult, ProofStatus, ProverCapabilities, ProverCapability};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A prover that answers with a fixed status after an optional delay
pub struct MockProver {
    pub name: String,
    pub status: ProofStatus,
    pub available: bool,
    /// Return `Err` instead of a result
    pub failing: bool,
    pub delay: Duration,
    pub capabilities: ProverCapabilities,
    calls: AtomicUsize,
}

impl MockProver {
    /// Create an available mock answering `status` immediately
    pub fn new(name: &str, status: ProofStatus) -> Self {
        MockProver {
            name: name.to_string(),
            status,
            available: true,
            failing: false,
            delay: Duration::ZERO,
            capabilities: ProverCapabilities::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProverCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_latency(mut self, typical_latency_ms: u64) -> Self {
        self.capabilities.typical_latency_ms = typical_latency_ms;
        self
    }

    /// Number of times `prove` actually ran
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProverCapability for MockProver {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn capabilities(&self) -> ProverCapabilities {
        self.capabilities.clone()
    }

    async fn prove(&self, _goal: &Formula, _axioms: &[Formula], _timeout: Duration) -> anyhow::Result<ProofResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing {
            anyhow::bail!("{} crashed", self.name);
        }
        Ok(ProofResult::new(self.status, self.name.clone()))
    }
}
