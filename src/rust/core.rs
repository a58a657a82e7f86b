// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core formula model for Noesis
//!
//! First-order logic extended with deontic and temporal operators. Every
//! type here is an immutable value with structural equality and a
//! deterministic hash: the proof cache and the rule matcher both rely on
//! two structurally identical formulas comparing and hashing equal no
//! matter how they were built.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// First-order term
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Variable bound by an enclosing quantifier
    Variable(String),

    /// Constant/individual
    Constant(String),

    /// Function application f(args...)
    Function { name: String, args: Vec<Term> },
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(name.into())
    }

    pub fn function(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Function { name: name.into(), args }
    }

    /// Name of the symbol at the head of this term
    pub fn name(&self) -> &str {
        match self {
            Term::Variable(name) | Term::Constant(name) => name,
            Term::Function { name, .. } => name,
        }
    }

    /// True when the term contains no variables
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(_) => true,
            Term::Function { args, .. } => args.iter().all(Term::is_ground),
        }
    }

    /// Replace every occurrence of variable `var` with `replacement`
    pub fn substitute(&self, var: &str, replacement: &Term) -> Term {
        match self {
            Term::Variable(name) if name == var => replacement.clone(),
            Term::Variable(_) | Term::Constant(_) => self.clone(),
            Term::Function { name, args } => Term::Function {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(var, replacement)).collect(),
            },
        }
    }

    fn collect_constants(&self, out: &mut BTreeSet<Term>) {
        match self {
            Term::Constant(_) => {
                out.insert(self.clone());
            }
            Term::Variable(_) => {}
            Term::Function { args, .. } => {
                for arg in args {
                    arg.collect_constants(out);
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) | Term::Constant(name) => write!(f, "{}", name),
            Term::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary propositional connective
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Connective {
    And,
    Or,
    Implies,
    Iff,
    Xor,
}

/// Quantifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// Deontic (normative) operator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeonticOp {
    Obligatory,
    Permitted,
    Forbidden,
}

/// Unary temporal operator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemporalOp {
    /// □ - holds at every accessible point
    Always,
    /// ◊ - holds at some accessible point
    Eventually,
    /// X - holds at the next point
    Next,
}

/// Binary temporal operator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryTemporalOp {
    Until,
    Since,
}

/// Universal formula representation consumed by every component
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Formula {
    /// Atomic predicate name(args...); zero arguments is a propositional atom
    Predicate { name: String, args: Vec<Term> },

    /// Negation ¬φ
    Not(Box<Formula>),

    /// Binary connective φ op ψ
    Binary {
        op: Connective,
        left: Box<Formula>,
        right: Box<Formula>,
    },

    /// Quantified formula ∀x. φ / ∃x. φ
    Quantified {
        quantifier: Quantifier,
        variable: String,
        body: Box<Formula>,
    },

    /// Deontic modality O(φ) / P(φ) / F(φ)
    Deontic { op: DeonticOp, body: Box<Formula> },

    /// Unary temporal modality □φ / ◊φ / Xφ
    Temporal { op: TemporalOp, body: Box<Formula> },

    /// Binary temporal modality φ U ψ / φ S ψ
    BinaryTemporal {
        op: BinaryTemporalOp,
        left: Box<Formula>,
        right: Box<Formula>,
    },
}

// The derived drop recurses once per level; a long chain built in code
// would exhaust the stack, so children are detached onto a heap stack and
// freed one at a time.
impl Drop for Formula {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl Formula {
    /// Move every child out, leaving empty atoms in their place
    fn detach_children(&mut self, out: &mut Vec<Formula>) {
        let mut take = |child: &mut Box<Formula>| {
            if !child.is_atomic() {
                out.push(std::mem::replace(child.as_mut(), Formula::empty()));
            }
        };
        match self {
            Formula::Predicate { .. } => {}
            Formula::Not(body)
            | Formula::Quantified { body, .. }
            | Formula::Deontic { body, .. }
            | Formula::Temporal { body, .. } => take(body),
            Formula::Binary { left, right, .. } | Formula::BinaryTemporal { left, right, .. } => {
                take(left);
                take(right);
            }
        }
    }

    fn empty() -> Self {
        Formula::Predicate { name: String::new(), args: Vec::new() }
    }
}

impl Formula {
    /// Propositional atom (zero-arity predicate)
    pub fn atom(name: impl Into<String>) -> Self {
        Formula::Predicate { name: name.into(), args: vec![] }
    }

    pub fn predicate(name: impl Into<String>, args: Vec<Term>) -> Self {
        Formula::Predicate { name: name.into(), args }
    }

    pub fn not(body: Formula) -> Self {
        Formula::Not(Box::new(body))
    }

    pub fn binary(op: Connective, left: Formula, right: Formula) -> Self {
        Formula::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::And, left, right)
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Or, left, right)
    }

    pub fn implies(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Implies, left, right)
    }

    pub fn iff(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Iff, left, right)
    }

    pub fn xor(left: Formula, right: Formula) -> Self {
        Self::binary(Connective::Xor, left, right)
    }

    pub fn quantified(quantifier: Quantifier, variable: impl Into<String>, body: Formula) -> Self {
        Formula::Quantified { quantifier, variable: variable.into(), body: Box::new(body) }
    }

    pub fn forall(variable: impl Into<String>, body: Formula) -> Self {
        Self::quantified(Quantifier::Forall, variable, body)
    }

    pub fn exists(variable: impl Into<String>, body: Formula) -> Self {
        Self::quantified(Quantifier::Exists, variable, body)
    }

    pub fn deontic(op: DeonticOp, body: Formula) -> Self {
        Formula::Deontic { op, body: Box::new(body) }
    }

    pub fn obligatory(body: Formula) -> Self {
        Self::deontic(DeonticOp::Obligatory, body)
    }

    pub fn permitted(body: Formula) -> Self {
        Self::deontic(DeonticOp::Permitted, body)
    }

    pub fn forbidden(body: Formula) -> Self {
        Self::deontic(DeonticOp::Forbidden, body)
    }

    pub fn temporal(op: TemporalOp, body: Formula) -> Self {
        Formula::Temporal { op, body: Box::new(body) }
    }

    pub fn always(body: Formula) -> Self {
        Self::temporal(TemporalOp::Always, body)
    }

    pub fn eventually(body: Formula) -> Self {
        Self::temporal(TemporalOp::Eventually, body)
    }

    pub fn next(body: Formula) -> Self {
        Self::temporal(TemporalOp::Next, body)
    }

    pub fn binary_temporal(op: BinaryTemporalOp, left: Formula, right: Formula) -> Self {
        Formula::BinaryTemporal { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn until(left: Formula, right: Formula) -> Self {
        Self::binary_temporal(BinaryTemporalOp::Until, left, right)
    }

    pub fn since(left: Formula, right: Formula) -> Self {
        Self::binary_temporal(BinaryTemporalOp::Since, left, right)
    }

    /// Direct children of this node, left to right
    pub fn children(&self) -> Vec<&Formula> {
        match self {
            Formula::Predicate { .. } => vec![],
            Formula::Not(body)
            | Formula::Quantified { body, .. }
            | Formula::Deontic { body, .. }
            | Formula::Temporal { body, .. } => vec![body.as_ref()],
            Formula::Binary { left, right, .. } | Formula::BinaryTemporal { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
        }
    }

    /// Maximum operator nesting; an atom has depth 1.
    ///
    /// Computed with an explicit stack so arbitrarily deep trees never
    /// exhaust the call stack.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            for child in node.children() {
                stack.push((child, depth + 1));
            }
        }
        max
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    /// Every subformula including `self`, in pre-order
    pub fn subformulas(&self) -> Vec<&Formula> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = node.children();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Owned set of subformulas, used for goal-directed rule matching
    pub fn subformula_set(&self) -> HashSet<Formula> {
        self.subformulas().into_iter().cloned().collect()
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Formula::Predicate { .. })
    }

    /// True if any deontic operator occurs
    pub fn contains_deontic(&self) -> bool {
        self.subformulas().iter().any(|f| matches!(f, Formula::Deontic { .. }))
    }

    /// True if any unary or binary temporal operator occurs
    pub fn contains_temporal(&self) -> bool {
        self.subformulas()
            .iter()
            .any(|f| matches!(f, Formula::Temporal { .. } | Formula::BinaryTemporal { .. }))
    }

    pub fn contains_quantifier(&self) -> bool {
        self.subformulas().iter().any(|f| matches!(f, Formula::Quantified { .. }))
    }

    /// Maximum number of temporal operators stacked on one path
    pub fn temporal_nesting(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, level)) = stack.pop() {
            let level = match node {
                Formula::Temporal { .. } | Formula::BinaryTemporal { .. } => level + 1,
                _ => level,
            };
            max = max.max(level);
            for child in node.children() {
                stack.push((child, level));
            }
        }
        max
    }

    /// Negation with one leading ¬ stripped instead of doubled
    pub fn negation(&self) -> Formula {
        match self {
            Formula::Not(inner) => inner.as_ref().clone(),
            other => Formula::not(other.clone()),
        }
    }

    /// Ground constants occurring anywhere in the formula, sorted
    pub fn constants(&self) -> BTreeSet<Term> {
        let mut out = BTreeSet::new();
        for node in self.subformulas() {
            if let Formula::Predicate { args, .. } = node {
                for arg in args {
                    arg.collect_constants(&mut out);
                }
            }
        }
        out
    }

    /// Capture-free substitution of `var` by `replacement`.
    ///
    /// Stops at quantifiers that rebind `var`.
    pub fn substitute(&self, var: &str, replacement: &Term) -> Formula {
        match self {
            Formula::Predicate { name, args } => Formula::Predicate {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(var, replacement)).collect(),
            },
            Formula::Not(body) => Formula::not(body.substitute(var, replacement)),
            Formula::Binary { op, left, right } => Formula::binary(
                *op,
                left.substitute(var, replacement),
                right.substitute(var, replacement),
            ),
            Formula::Quantified { variable, .. } if variable == var => self.clone(),
            Formula::Quantified { quantifier, variable, body } => {
                Formula::quantified(*quantifier, variable.clone(), body.substitute(var, replacement))
            }
            Formula::Deontic { op, body } => Formula::deontic(*op, body.substitute(var, replacement)),
            Formula::Temporal { op, body } => Formula::temporal(*op, body.substitute(var, replacement)),
            Formula::BinaryTemporal { op, left, right } => Formula::binary_temporal(
                *op,
                left.substitute(var, replacement),
                right.substitute(var, replacement),
            ),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::parser::serialize(self))
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Connective::And => "∧",
            Connective::Or => "∨",
            Connective::Implies => "→",
            Connective::Iff => "↔",
            Connective::Xor => "⊕",
        };
        write!(f, "{}", symbol)
    }
}

/// Axioms plus theorems proved so far in one proof session.
///
/// Append-only: a session may add theorems, never remove facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    axioms: Vec<Formula>,
    theorems: Vec<Formula>,
}

impl KnowledgeBase {
    pub fn new(axioms: Vec<Formula>) -> Self {
        KnowledgeBase { axioms, theorems: vec![] }
    }

    pub fn add_axiom(&mut self, axiom: Formula) {
        if !self.axioms.contains(&axiom) {
            self.axioms.push(axiom);
        }
    }

    pub fn add_theorem(&mut self, theorem: Formula) {
        if !self.theorems.contains(&theorem) && !self.axioms.contains(&theorem) {
            self.theorems.push(theorem);
        }
    }

    pub fn axioms(&self) -> &[Formula] {
        &self.axioms
    }

    pub fn theorems(&self) -> &[Formula] {
        &self.theorems
    }

    /// Axioms followed by theorems, in insertion order
    pub fn facts(&self) -> impl Iterator<Item = &Formula> {
        self.axioms.iter().chain(self.theorems.iter())
    }

    pub fn len(&self) -> usize {
        self.axioms.len() + self.theorems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(f: &Formula) -> u64 {
        let mut hasher = DefaultHasher::new();
        f.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_structural_equality_independent_of_construction() {
        let built = Formula::implies(Formula::atom("P"), Formula::atom("Q"));
        let literal = Formula::Binary {
            op: Connective::Implies,
            left: Box::new(Formula::Predicate { name: "P".to_string(), args: vec![] }),
            right: Box::new(Formula::Predicate { name: "Q".to_string(), args: vec![] }),
        };
        assert_eq!(built, literal);
        assert_eq!(hash_of(&built), hash_of(&literal));
    }

    #[test]
    fn test_deep_formula_drops_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let mut chain = Formula::atom("A");
                for i in 0..300_000 {
                    chain = if i % 2 == 0 {
                        Formula::and(chain, Formula::atom("A"))
                    } else {
                        Formula::not(chain)
                    };
                }
                let depth = chain.depth();
                drop(chain);
                depth
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), 300_001);
    }

    #[test]
    fn test_operand_order_is_significant() {
        let ab = Formula::and(Formula::atom("A"), Formula::atom("B"));
        let ba = Formula::and(Formula::atom("B"), Formula::atom("A"));
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_depth_and_size() {
        let f = Formula::not(Formula::and(Formula::atom("A"), Formula::always(Formula::atom("B"))));
        assert_eq!(f.depth(), 4);
        assert_eq!(f.size(), 5);
        assert_eq!(Formula::atom("A").depth(), 1);
    }

    #[test]
    fn test_depth_of_deep_chain_is_iterative() {
        let mut f = Formula::atom("P");
        for _ in 0..5_000 {
            f = Formula::not(f);
        }
        assert_eq!(f.depth(), 5_001);
    }

    #[test]
    fn test_substitution_respects_rebinding() {
        let body = Formula::predicate("Human", vec![Term::var("x")]);
        let inner = Formula::forall("x", body.clone());
        let f = Formula::and(body, inner.clone());
        let result = f.substitute("x", &Term::constant("socrates"));
        assert_eq!(
            result,
            Formula::and(Formula::predicate("Human", vec![Term::constant("socrates")]), inner)
        );
    }

    #[test]
    fn test_constants_are_collected_through_functions() {
        let f = Formula::predicate(
            "Likes",
            vec![Term::constant("alice"), Term::function("mother", vec![Term::constant("bob")])],
        );
        let names: Vec<String> = f.constants().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_temporal_nesting() {
        let f = Formula::always(Formula::eventually(Formula::atom("P")));
        assert_eq!(f.temporal_nesting(), 2);
        assert!(f.contains_temporal());
        assert!(!f.contains_deontic());
    }

    #[test]
    fn test_negation_strips_double() {
        let p = Formula::atom("P");
        assert_eq!(Formula::not(p.clone()).negation(), p);
        assert_eq!(p.negation(), Formula::not(p.clone()));
    }

    #[test]
    fn test_knowledge_base_is_append_only_and_deduplicated() {
        let mut kb = KnowledgeBase::new(vec![Formula::atom("P")]);
        kb.add_theorem(Formula::atom("P"));
        kb.add_theorem(Formula::atom("Q"));
        kb.add_theorem(Formula::atom("Q"));
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.theorems(), &[Formula::atom("Q")]);
    }
}
