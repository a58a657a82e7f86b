// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Custom assertions for Noesis tests

use noesis::{parse, serialize, Formula, ProofResult, ProofStatus};
use pretty_assertions::assert_eq;

/// Assert the result has `status` and was produced by `prover`
pub fn assert_outcome(result: &ProofResult, status: ProofStatus, prover: &str) {
    assert_eq!(
        (result.status, result.prover_used.as_str()),
        (status, prover),
        "unexpected outcome: {:?}",
        result.message
    );
}

/// Assert the proof used exactly these rules, in order
pub fn assert_rules(result: &ProofResult, expected: &[&str]) {
    let rules: Vec<&str> = result.steps.iter().map(|s| s.rule.as_str()).collect();
    assert_eq!(rules, expected);
}

/// Assert a formula survives serialization unchanged
pub fn assert_round_trip(formula: &Formula) {
    let text = serialize(formula);
    let reparsed = parse(&text).unwrap_or_else(|e| panic!("failed to re-parse {:?}: {}", text, e));
    assert_eq!(&reparsed, formula, "round trip through {:?}", text);
}

/// Assert two results are the same apart from timing and cache annotation
pub fn assert_same_outcome(left: &ProofResult, right: &ProofResult) {
    assert_eq!(left.status, right.status);
    assert_eq!(left.steps, right.steps);
    assert_eq!(left.prover_used, right.prover_used);
    assert!(left.same_outcome(right));
}
