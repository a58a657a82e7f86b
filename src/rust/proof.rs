// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Proof results shared by every prover
//!
//! A `ProofResult` is created once per proof attempt and never mutated
//! afterwards, except for the cache annotation applied on a hit.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::Formula;
use crate::inference::modal::ModalLogic;

/// Outcome of a proof attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofStatus {
    /// The goal follows from the axioms
    Proved,
    /// A counter-model exists (open tableau branch after full expansion)
    Disproved,
    /// Search finished without a proof; not a disproof
    Unknown,
    /// Wall-clock budget exhausted or cancelled
    Timeout,
    /// Step budget, fact limit or formula depth limit exhausted
    DepthExceeded,
    /// The prover failed to run
    Error,
}

impl ProofStatus {
    /// Proved or Disproved
    pub fn is_decisive(&self) -> bool {
        matches!(self, ProofStatus::Proved | ProofStatus::Disproved)
    }

    /// Outcomes worth caching: deterministic for a fixed configuration
    pub fn is_cacheable(&self) -> bool {
        matches!(self, ProofStatus::Proved | ProofStatus::Disproved | ProofStatus::Unknown)
    }

    /// Budget-related outcomes
    pub fn is_resource_limit(&self) -> bool {
        matches!(self, ProofStatus::Timeout | ProofStatus::DepthExceeded)
    }
}

impl std::fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One rule application in a proof trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Stable rule name
    pub rule: String,

    /// Facts consumed by the rule
    pub premises: Vec<Formula>,

    /// Fact produced by the rule
    pub conclusion: Formula,

    /// Free-text explanation
    pub justification: String,
}

/// A formula and its negation were both derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inconsistency {
    pub formula: Formula,
    pub negation: Formula,
}

/// Result of one proof attempt by one prover (or an aggregate of several)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResult {
    pub status: ProofStatus,

    /// Ordered proof trace; empty for cache hits of external provers
    pub steps: Vec<ProofStep>,

    /// Time spent producing the result
    pub elapsed: Duration,

    /// Identity of the prover that produced the result
    pub prover_used: String,

    /// Set when the result was served from the proof cache
    pub from_cache: bool,

    /// Modal logic used by the native engine, if modal reasoning was engaged
    pub modal_logic: Option<ModalLogic>,

    /// Contradictory facts found while proving
    pub inconsistency: Option<Inconsistency>,

    /// Per-candidate results carried by aggregate results
    pub sub_results: Vec<ProofResult>,

    /// Human-readable detail (error text, reason for giving up)
    pub message: Option<String>,
}

impl ProofResult {
    pub fn new(status: ProofStatus, prover: impl Into<String>) -> Self {
        ProofResult {
            status,
            steps: vec![],
            elapsed: Duration::ZERO,
            prover_used: prover.into(),
            from_cache: false,
            modal_logic: None,
            inconsistency: None,
            sub_results: vec![],
            message: None,
        }
    }

    /// Result for a prover that failed to run
    pub fn error(prover: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProofStatus::Error, prover).with_message(message)
    }

    pub fn with_steps(mut self, steps: Vec<ProofStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_proved(&self) -> bool {
        self.status == ProofStatus::Proved
    }

    /// Same outcome and trace, ignoring timing and cache annotation
    pub fn same_outcome(&self, other: &ProofResult) -> bool {
        self.status == other.status
            && self.steps == other.steps
            && self.prover_used == other.prover_used
            && self.modal_logic == other.modal_logic
            && self.inconsistency == other.inconsistency
    }
}
