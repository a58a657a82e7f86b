// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later
// Property-based testing for Noesis invariants

mod common;

use common::assertions::assert_round_trip;
use common::generators::{arb_formula, arb_propositional};
use noesis::{parse, serialize, CacheKey, Formula, FormulaAnalyzer, InferenceEngine, ProofStatus};
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    // Parsing then serializing should be identity
    #[test]
    fn parse_serialize_roundtrip(formula in arb_formula()) {
        assert_round_trip(&formula);
    }

    // Canonical text is a fixpoint of parse then serialize
    #[test]
    fn serialization_is_canonical(formula in arb_formula()) {
        let text = serialize(&formula);
        let again = serialize(&parse(&text).unwrap());
        prop_assert_eq!(text, again);
    }

    // Negating an explicit negation strips it
    #[test]
    fn negation_strips_leading_not(formula in arb_formula()) {
        let negated = Formula::not(formula.clone());
        prop_assert_eq!(negated.negation(), formula);
    }

    #[test]
    fn complexity_score_in_range(formula in arb_formula()) {
        let analysis = FormulaAnalyzer::default().analyze(&formula);
        prop_assert!(analysis.complexity_score <= 100);
        prop_assert!(analysis.nesting_level <= formula.depth());
        prop_assert_eq!(analysis.size, formula.size());
        prop_assert!(!analysis.recommended_provers.is_empty());
    }

    #[test]
    fn analysis_is_deterministic(formula in arb_formula()) {
        let analyzer = FormulaAnalyzer::default();
        prop_assert_eq!(analyzer.analyze(&formula), analyzer.analyze(&formula.clone()));
    }

    // Structurally equal inputs always produce the same key
    #[test]
    fn cache_key_is_structural(goal in arb_formula(), axiom in arb_formula()) {
        let reparsed_goal = parse(&serialize(&goal)).unwrap();
        let config = BTreeMap::new();
        let a = CacheKey::new(&goal, &[axiom.clone()], "native", &config);
        let b = CacheKey::new(&reparsed_goal, &[axiom], "native", &config);
        prop_assert_eq!(a, b);
    }

    // The engine never claims a disproof from propositional forward chaining
    #[test]
    fn propositional_proofs_are_never_disproofs(goal in arb_propositional(), axiom in arb_propositional()) {
        let engine = InferenceEngine::default();
        let result = engine.prove(&goal, &[axiom], engine.default_budget());
        prop_assert_ne!(result.status, ProofStatus::Disproved);
        prop_assert_ne!(result.status, ProofStatus::Error);
    }

    // A goal among the axioms is proved without steps
    #[test]
    fn axioms_prove_themselves(formula in arb_propositional()) {
        let engine = InferenceEngine::default();
        let result = engine.prove(&formula, &[formula.clone()], engine.default_budget());
        prop_assert_eq!(result.status, ProofStatus::Proved);
        prop_assert!(result.steps.is_empty());
    }
}
