// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Property-based testing generators for Noesis types
//!
//! Names avoid the single letters the parser reads as operators (O, P, F,
//! X, U, S) and the keywords. Variables only appear under a quantifier
//! that binds them, so every generated formula is one the parser can
//! produce.

use noesis::{Formula, Term};
use proptest::prelude::*;

const PREDICATES: &[&str] = &["Human", "Mortal", "Q", "R", "Likes"];
const CONSTANTS: &[&str] = &["a", "b", "c"];
const VARIABLES: &[&str] = &["x", "y", "z"];
const FUNCTIONS: &[&str] = &["f", "g"];
const ATOMS: &[&str] = &["Q", "R", "Human"];

/// Strategy for constants
pub fn arb_constant() -> impl Strategy<Value = Term> {
    prop::sample::select(CONSTANTS).prop_map(Term::constant)
}

/// Strategy for terms over the given bound variables
pub fn scoped_term(bound: Vec<&'static str>) -> BoxedStrategy<Term> {
    let simple: BoxedStrategy<Term> = if bound.is_empty() {
        arb_constant().boxed()
    } else {
        prop_oneof![arb_constant(), prop::sample::select(bound).prop_map(Term::var)].boxed()
    };

    prop_oneof![
        3 => simple.clone(),
        1 => (prop::sample::select(FUNCTIONS), simple).prop_map(|(f, arg)| Term::function(f, vec![arg])),
    ]
    .boxed()
}

/// Strategy for atomic formulas
pub fn scoped_atom(bound: Vec<&'static str>) -> BoxedStrategy<Formula> {
    (prop::sample::select(PREDICATES), prop::collection::vec(scoped_term(bound), 0..3))
        .prop_map(|(name, args)| Formula::predicate(name, args))
        .boxed()
}

/// Strategy for formulas of bounded depth over the given bound variables
pub fn scoped_formula(depth: u32, bound: Vec<&'static str>) -> BoxedStrategy<Formula> {
    let leaf = scoped_atom(bound.clone());
    if depth == 0 {
        return leaf;
    }

    let inner = scoped_formula(depth - 1, bound.clone());
    let quantified = prop::sample::select(VARIABLES).prop_flat_map(move |var| {
        let mut scope = bound.clone();
        scope.push(var);
        (any::<bool>(), scoped_formula(depth - 1, scope)).prop_map(move |(universal, body)| {
            if universal {
                Formula::forall(var, body)
            } else {
                Formula::exists(var, body)
            }
        })
    });

    let connectives = prop_oneof![
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::and(l, r)),
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::or(l, r)),
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::implies(l, r)),
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::iff(l, r)),
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::xor(l, r)),
    ];
    let modalities = prop_oneof![
        inner.clone().prop_map(Formula::obligatory),
        inner.clone().prop_map(Formula::permitted),
        inner.clone().prop_map(Formula::forbidden),
        inner.clone().prop_map(Formula::always),
        inner.clone().prop_map(Formula::eventually),
        inner.clone().prop_map(Formula::next),
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::until(l, r)),
        (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::since(l, r)),
    ];

    prop_oneof![
        3 => leaf,
        1 => inner.prop_map(Formula::not),
        5 => connectives,
        1 => quantified,
        6 => modalities,
    ]
    .boxed()
}

/// Strategy for closed formulas
pub fn arb_formula() -> BoxedStrategy<Formula> {
    scoped_formula(3, vec![])
}

/// Strategy for small propositional formulas over a few atoms
pub fn arb_propositional() -> BoxedStrategy<Formula> {
    let atom = prop::sample::select(ATOMS).prop_map(Formula::atom);
    atom.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::and(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::or(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| Formula::implies(l, r)),
        ]
    })
    .boxed()
}
