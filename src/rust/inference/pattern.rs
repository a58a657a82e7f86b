// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Formula patterns with metavariables
//!
//! Schema rules are written as patterns over formulas. A metavariable
//! matches any formula; repeated metavariables must match structurally
//! equal formulas. Matching is purely syntactic.

use std::collections::BTreeMap;

use crate::core::{BinaryTemporalOp, Connective, DeonticOp, Formula, TemporalOp};

/// Metavariable bindings; ordered so instantiation is deterministic
pub type Bindings = BTreeMap<&'static str, Formula>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Meta(&'static str),
    Not(Box<Pattern>),
    Binary(Connective, Box<Pattern>, Box<Pattern>),
    Deontic(DeonticOp, Box<Pattern>),
    Temporal(TemporalOp, Box<Pattern>),
    BinaryTemporal(BinaryTemporalOp, Box<Pattern>, Box<Pattern>),
}

// Builders keep the rule tables readable.

pub fn meta(name: &'static str) -> Pattern {
    Pattern::Meta(name)
}

pub fn not(p: Pattern) -> Pattern {
    Pattern::Not(Box::new(p))
}

pub fn and(l: Pattern, r: Pattern) -> Pattern {
    Pattern::Binary(Connective::And, Box::new(l), Box::new(r))
}

pub fn or(l: Pattern, r: Pattern) -> Pattern {
    Pattern::Binary(Connective::Or, Box::new(l), Box::new(r))
}

pub fn implies(l: Pattern, r: Pattern) -> Pattern {
    Pattern::Binary(Connective::Implies, Box::new(l), Box::new(r))
}

pub fn iff(l: Pattern, r: Pattern) -> Pattern {
    Pattern::Binary(Connective::Iff, Box::new(l), Box::new(r))
}

pub fn xor(l: Pattern, r: Pattern) -> Pattern {
    Pattern::Binary(Connective::Xor, Box::new(l), Box::new(r))
}

pub fn obligatory(p: Pattern) -> Pattern {
    Pattern::Deontic(DeonticOp::Obligatory, Box::new(p))
}

pub fn permitted(p: Pattern) -> Pattern {
    Pattern::Deontic(DeonticOp::Permitted, Box::new(p))
}

pub fn forbidden(p: Pattern) -> Pattern {
    Pattern::Deontic(DeonticOp::Forbidden, Box::new(p))
}

pub fn always(p: Pattern) -> Pattern {
    Pattern::Temporal(TemporalOp::Always, Box::new(p))
}

pub fn eventually(p: Pattern) -> Pattern {
    Pattern::Temporal(TemporalOp::Eventually, Box::new(p))
}

pub fn until(l: Pattern, r: Pattern) -> Pattern {
    Pattern::BinaryTemporal(BinaryTemporalOp::Until, Box::new(l), Box::new(r))
}

impl Pattern {
    /// Match `formula`, extending `bindings`. On failure the bindings may
    /// hold partial entries; callers match against a scratch copy.
    pub fn matches(&self, formula: &Formula, bindings: &mut Bindings) -> bool {
        match (self, formula) {
            (Pattern::Meta(name), f) => match bindings.get(name) {
                Some(bound) => bound == f,
                None => {
                    bindings.insert(*name, f.clone());
                    true
                }
            },
            (Pattern::Not(p), Formula::Not(body)) => p.matches(body, bindings),
            (Pattern::Binary(op, pl, pr), Formula::Binary { op: fop, left, right }) => {
                op == fop && pl.matches(left, bindings) && pr.matches(right, bindings)
            }
            (Pattern::Deontic(op, p), Formula::Deontic { op: fop, body }) => {
                op == fop && p.matches(body, bindings)
            }
            (Pattern::Temporal(op, p), Formula::Temporal { op: fop, body }) => {
                op == fop && p.matches(body, bindings)
            }
            (
                Pattern::BinaryTemporal(op, pl, pr),
                Formula::BinaryTemporal { op: fop, left, right },
            ) => op == fop && pl.matches(left, bindings) && pr.matches(right, bindings),
            _ => false,
        }
    }

    /// Match against a copy of `bindings`, returning the extension on success
    pub fn match_with(&self, formula: &Formula, bindings: &Bindings) -> Option<Bindings> {
        let mut scratch = bindings.clone();
        if self.matches(formula, &mut scratch) {
            Some(scratch)
        } else {
            None
        }
    }

    /// Build a formula from the template; `None` if a metavariable is unbound
    pub fn instantiate(&self, bindings: &Bindings) -> Option<Formula> {
        Some(match self {
            Pattern::Meta(name) => bindings.get(name)?.clone(),
            Pattern::Not(p) => Formula::not(p.instantiate(bindings)?),
            Pattern::Binary(op, l, r) => {
                Formula::binary(*op, l.instantiate(bindings)?, r.instantiate(bindings)?)
            }
            Pattern::Deontic(op, p) => Formula::deontic(*op, p.instantiate(bindings)?),
            Pattern::Temporal(op, p) => Formula::temporal(*op, p.instantiate(bindings)?),
            Pattern::BinaryTemporal(op, l, r) => {
                Formula::binary_temporal(*op, l.instantiate(bindings)?, r.instantiate(bindings)?)
            }
        })
    }
}
