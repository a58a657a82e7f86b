// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Common test utilities for the Noesis test suite

#![allow(dead_code)]

use noesis::analyzer::{AnalyzerConfig, FormulaAnalyzer, ProverMapping};
use noesis::config::RouterConfig;
use noesis::{parse, Formula, ProofCache, ProverCapability, ProverRegistry, ProverRouter};
use std::sync::Arc;

pub mod assertions;
pub mod generators;
pub mod mock_prover;

/// Parse a list of formula texts
pub fn formulas(texts: &[&str]) -> Vec<Formula> {
    texts.iter().map(|t| parse(t).unwrap()).collect()
}

/// Router over the given provers whose analyzer ranks them in the given
/// order for every problem
pub fn router_with(provers: Vec<Arc<dyn ProverCapability>>) -> ProverRouter {
    let ranking = provers.iter().map(|p| p.name().to_string()).collect();
    let mut registry = ProverRegistry::new();
    for prover in provers {
        registry.register(prover);
    }

    let analyzer = FormulaAnalyzer::new(AnalyzerConfig {
        prover_mapping: ProverMapping { rules: vec![], fallback: ranking },
        ..AnalyzerConfig::default()
    });
    ProverRouter::new(registry, analyzer, Arc::new(ProofCache::default()), RouterConfig::default())
}

/// Classic syllogism problem
pub fn socrates() -> (Formula, Vec<Formula>) {
    (
        parse("Mortal(socrates)").unwrap(),
        formulas(&["∀x. Human(x) → Mortal(x)", "Human(socrates)"]),
    )
}
