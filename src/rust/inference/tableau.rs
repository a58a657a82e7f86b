// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Labelled modal tableau
//!
//! Refutation search over possible worlds: the facts and the negated goal
//! are placed in world 0 and expanded until every branch closes (the goal
//! follows) or a branch is fully expanded without a clash (a counter-model).
//!
//! Temporal (`□`, `◊`) and deontic (`O`, `P`, `F`) modalities use separate
//! accessibility relations that share the frame conditions of the selected
//! logic. `X` gets a unique successor world. `U` and `S` are expanded with
//! a weakened rule, and any branch that relied on a weakened rule or hit a
//! world or domain limit can no longer witness a counter-model.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use super::modal::ModalLogic;
use super::{Exhaustion, Meter};
use crate::core::{BinaryTemporalOp, Connective, DeonticOp, Formula, Quantifier, TemporalOp, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Relation {
    Temporal,
    Deontic,
}

const RELATIONS: [Relation; 2] = [Relation::Temporal, Relation::Deontic];

type World = usize;
type Labelled = (World, Formula);

/// Outcome of a tableau run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableauVerdict {
    /// Every branch closed
    Closed { branches: usize, worlds: usize },
    /// A fully expanded branch stayed open
    Open { worlds: usize },
    /// Some branch could not be decided (weakened expansion or limits)
    Incomplete,
    /// Step or time budget ran out
    Exhausted(Exhaustion),
}

/// Tableau limits for one run
#[derive(Debug, Clone, Copy)]
pub struct Tableau {
    pub logic: ModalLogic,
    pub max_worlds: usize,
    pub max_branches: usize,
}

enum Step {
    Progress,
    Split(Vec<Vec<Labelled>>),
    Complete,
}

#[derive(Clone)]
struct Branch {
    logic: ModalLogic,
    max_worlds: usize,
    pending: Vec<Labelled>,
    seen: HashSet<Labelled>,
    worlds: usize,
    edges: BTreeSet<(Relation, World, World)>,
    boxes: Vec<(Relation, World, Formula)>,
    gammas: Vec<(World, String, Formula)>,
    domain: Vec<Term>,
    next_of: HashMap<World, World>,
    fresh: usize,
    closed: bool,
    approximated: bool,
}

impl Branch {
    fn new(logic: ModalLogic, max_worlds: usize, domain: Vec<Term>) -> Self {
        let mut branch = Branch {
            logic,
            max_worlds,
            pending: Vec::new(),
            seen: HashSet::new(),
            worlds: 1,
            edges: BTreeSet::new(),
            boxes: Vec::new(),
            gammas: Vec::new(),
            domain,
            next_of: HashMap::new(),
            fresh: 0,
            closed: false,
            approximated: false,
        };
        branch.add_reflexive_edges(0);
        branch
    }

    fn add(&mut self, world: World, formula: Formula) {
        if self.closed || self.seen.contains(&(world, formula.clone())) {
            return;
        }
        if self.seen.contains(&(world, formula.negation())) {
            self.closed = true;
            return;
        }
        self.seen.insert((world, formula.clone()));
        self.pending.push((world, formula));
    }

    fn add_reflexive_edges(&mut self, world: World) {
        if self.logic.is_reflexive() {
            for relation in RELATIONS {
                self.edges.insert((relation, world, world));
            }
        }
    }

    fn new_world(&mut self) -> Option<World> {
        if self.worlds >= self.max_worlds {
            self.approximated = true;
            return None;
        }
        let world = self.worlds;
        self.worlds += 1;
        self.add_reflexive_edges(world);
        Some(world)
    }

    fn successors(&self, relation: Relation, world: World) -> Vec<World> {
        self.edges
            .iter()
            .filter(|(r, from, _)| *r == relation && *from == world)
            .map(|(_, _, to)| *to)
            .collect()
    }

    /// Add an edge and close the relation under the frame conditions
    fn connect(&mut self, relation: Relation, from: World, to: World) {
        self.edges.insert((relation, from, to));
        if self.logic.is_symmetric() {
            self.edges.insert((relation, to, from));
        }
        if self.logic.is_transitive() {
            loop {
                let current: Vec<(World, World)> = self
                    .edges
                    .iter()
                    .filter(|(r, _, _)| *r == relation)
                    .map(|(_, a, b)| (*a, *b))
                    .collect();
                let mut added = false;
                for &(a, b) in &current {
                    for &(c, d) in &current {
                        if b == c && self.edges.insert((relation, a, d)) {
                            added = true;
                        }
                    }
                }
                if !added {
                    break;
                }
            }
        }
        self.propagate_boxes();
    }

    fn propagate_boxes(&mut self) {
        let mut additions = Vec::new();
        for (relation, world, body) in &self.boxes {
            for target in self.successors(*relation, *world) {
                additions.push((target, body.clone()));
            }
        }
        for (world, body) in additions {
            self.add(world, body);
        }
    }

    fn expand_box(&mut self, relation: Relation, world: World, body: Formula) {
        self.boxes.push((relation, world, body.clone()));
        for target in self.successors(relation, world) {
            self.add(target, body.clone());
        }
    }

    fn expand_diamond(&mut self, relation: Relation, world: World, body: Formula) {
        // Already witnessed by an accessible world
        let witnessed = self
            .successors(relation, world)
            .into_iter()
            .any(|target| self.seen.contains(&(target, body.clone())));
        if witnessed {
            return;
        }
        if let Some(target) = self.new_world() {
            self.add(target, body);
            self.connect(relation, world, target);
        }
    }

    fn expand_next(&mut self, world: World, body: Formula) {
        let target = match self.next_of.get(&world) {
            Some(&target) => target,
            None => match self.new_world() {
                Some(target) => {
                    self.next_of.insert(world, target);
                    self.connect(Relation::Temporal, world, target);
                    target
                }
                None => return,
            },
        };
        self.add(target, body);
    }

    fn fresh_constant(&mut self) -> Option<Term> {
        if self.domain.len() >= self.max_worlds {
            self.approximated = true;
            return None;
        }
        loop {
            self.fresh += 1;
            let candidate = Term::constant(format!("sk{}", self.fresh));
            if !self.domain.contains(&candidate) {
                self.domain.push(candidate.clone());
                return Some(candidate);
            }
        }
    }

    fn instantiate_gammas(&mut self, constant: &Term) {
        let instances: Vec<Labelled> = self
            .gammas
            .iter()
            .map(|(world, variable, body)| (*world, body.substitute(variable, constant)))
            .collect();
        for (world, instance) in instances {
            self.add(world, instance);
        }
    }

    fn expand_gamma(&mut self, world: World, variable: String, body: Formula) {
        self.gammas.push((world, variable.clone(), body.clone()));
        if self.domain.is_empty() {
            // Domains are non-empty
            if let Some(constant) = self.fresh_constant() {
                self.instantiate_gammas(&constant);
            }
            return;
        }
        for constant in self.domain.clone() {
            self.add(world, body.substitute(&variable, &constant));
        }
    }

    fn expand_delta(&mut self, world: World, variable: &str, body: &Formula) {
        if let Some(constant) = self.fresh_constant() {
            self.add(world, body.substitute(variable, &constant));
            self.instantiate_gammas(&constant);
        }
    }

    /// Serial frames need a successor wherever a box-like formula lives
    fn ensure_seriality(&mut self) -> bool {
        if !self.logic.is_serial() || self.logic.is_reflexive() {
            return false;
        }
        let needy: BTreeSet<(Relation, World)> = self
            .boxes
            .iter()
            .filter(|(relation, world, _)| self.successors(*relation, *world).is_empty())
            .map(|(relation, world, _)| (*relation, *world))
            .collect();
        let mut progressed = false;
        for (relation, world) in needy {
            if let Some(target) = self.new_world() {
                self.connect(relation, world, target);
                progressed = true;
            }
        }
        progressed
    }

    /// Pending formula to expand next: non-branching first, then
    /// world-creating, then branching.
    fn pick(&self) -> Option<usize> {
        (0..3).find_map(|rank| self.pending.iter().position(|(_, f)| priority(f) == rank))
    }

    fn step(&mut self) -> Step {
        let index = match self.pick() {
            Some(index) => index,
            None => {
                if self.ensure_seriality() {
                    return Step::Progress;
                }
                return Step::Complete;
            }
        };
        let (w, formula) = self.pending.remove(index);
        self.expand(w, &formula)
    }

    fn expand(&mut self, w: World, formula: &Formula) -> Step {
        use Connective::*;

        match formula {
            Formula::Predicate { .. } => {}
            Formula::Binary { op: And, left, right } => {
                self.add(w, left.as_ref().clone());
                self.add(w, right.as_ref().clone());
            }
            Formula::Binary { op: Or, left, right } => {
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                return Step::Split(vec![vec![(w, l)], vec![(w, r)]]);
            }
            Formula::Binary { op: Implies, left, right } => {
                return Step::Split(vec![vec![(w, left.negation())], vec![(w, right.as_ref().clone())]]);
            }
            Formula::Binary { op: Iff, left, right } => {
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                let (nl, nr) = (left.negation(), right.negation());
                return Step::Split(vec![vec![(w, l), (w, r)], vec![(w, nl), (w, nr)]]);
            }
            Formula::Binary { op: Xor, left, right } => {
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                let (nl, nr) = (left.negation(), right.negation());
                return Step::Split(vec![vec![(w, l), (w, nr)], vec![(w, nl), (w, r)]]);
            }
            Formula::Quantified { quantifier: Quantifier::Forall, variable, body } => {
                self.expand_gamma(w, variable.clone(), body.as_ref().clone());
            }
            Formula::Quantified { quantifier: Quantifier::Exists, variable, body } => {
                self.expand_delta(w, variable, body);
            }
            Formula::Deontic { op: DeonticOp::Obligatory, body } => {
                self.expand_box(Relation::Deontic, w, body.as_ref().clone());
            }
            Formula::Deontic { op: DeonticOp::Permitted, body } => {
                self.expand_diamond(Relation::Deontic, w, body.as_ref().clone());
            }
            Formula::Deontic { op: DeonticOp::Forbidden, body } => {
                self.expand_box(Relation::Deontic, w, body.negation());
            }
            Formula::Temporal { op: TemporalOp::Always, body } => {
                self.expand_box(Relation::Temporal, w, body.as_ref().clone());
            }
            Formula::Temporal { op: TemporalOp::Eventually, body } => {
                self.expand_diamond(Relation::Temporal, w, body.as_ref().clone());
            }
            Formula::Temporal { op: TemporalOp::Next, body } => {
                self.expand_next(w, body.as_ref().clone());
            }
            Formula::BinaryTemporal { op: BinaryTemporalOp::Until, left, right } => {
                self.approximated = true;
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                let eventually = Formula::eventually(r.clone());
                return Step::Split(vec![vec![(w, r)], vec![(w, l), (w, eventually)]]);
            }
            Formula::BinaryTemporal { op: BinaryTemporalOp::Since, left, right } => {
                self.approximated = true;
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                return Step::Split(vec![vec![(w, r)], vec![(w, l)]]);
            }
            Formula::Not(inner) => return self.expand_negated(w, inner),
        }
        Step::Progress
    }

    fn expand_negated(&mut self, w: World, inner: &Formula) -> Step {
        use Connective::*;

        match inner {
            Formula::Predicate { .. } => {}
            Formula::Not(body) => self.add(w, body.as_ref().clone()),
            Formula::Binary { op: And, left, right } => {
                return Step::Split(vec![vec![(w, left.negation())], vec![(w, right.negation())]]);
            }
            Formula::Binary { op: Or, left, right } => {
                self.add(w, left.negation());
                self.add(w, right.negation());
            }
            Formula::Binary { op: Implies, left, right } => {
                self.add(w, left.as_ref().clone());
                self.add(w, right.negation());
            }
            Formula::Binary { op: Iff, left, right } => {
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                let (nl, nr) = (left.negation(), right.negation());
                return Step::Split(vec![vec![(w, l), (w, nr)], vec![(w, nl), (w, r)]]);
            }
            Formula::Binary { op: Xor, left, right } => {
                let (l, r) = (left.as_ref().clone(), right.as_ref().clone());
                let (nl, nr) = (left.negation(), right.negation());
                return Step::Split(vec![vec![(w, l), (w, r)], vec![(w, nl), (w, nr)]]);
            }
            Formula::Quantified { quantifier: Quantifier::Forall, variable, body } => {
                self.expand_delta(w, variable, &body.negation());
            }
            Formula::Quantified { quantifier: Quantifier::Exists, variable, body } => {
                self.expand_gamma(w, variable.clone(), body.negation());
            }
            Formula::Deontic { op: DeonticOp::Obligatory, body } => {
                self.expand_diamond(Relation::Deontic, w, body.negation());
            }
            Formula::Deontic { op: DeonticOp::Permitted, body } => {
                self.expand_box(Relation::Deontic, w, body.negation());
            }
            Formula::Deontic { op: DeonticOp::Forbidden, body } => {
                self.expand_diamond(Relation::Deontic, w, body.as_ref().clone());
            }
            Formula::Temporal { op: TemporalOp::Always, body } => {
                self.expand_diamond(Relation::Temporal, w, body.negation());
            }
            Formula::Temporal { op: TemporalOp::Eventually, body } => {
                self.expand_box(Relation::Temporal, w, body.negation());
            }
            Formula::Temporal { op: TemporalOp::Next, body } => {
                self.expand_next(w, body.negation());
            }
            Formula::BinaryTemporal { right, .. } => {
                self.approximated = true;
                self.add(w, right.negation());
            }
        }
        Step::Progress
    }
}

/// 0: no branching or world creation, 1: creates worlds or constants, 2: branches
fn priority(formula: &Formula) -> u8 {
    use Connective::*;

    match formula {
        Formula::Binary { op: Or | Implies | Iff | Xor, .. } | Formula::BinaryTemporal { .. } => 2,
        Formula::Not(inner) => match inner.as_ref() {
            Formula::Binary { op: And | Iff | Xor, .. } => 2,
            Formula::Temporal { op: TemporalOp::Always | TemporalOp::Next, .. }
            | Formula::Deontic { op: DeonticOp::Obligatory | DeonticOp::Forbidden, .. }
            | Formula::Quantified { quantifier: Quantifier::Forall, .. } => 1,
            _ => 0,
        },
        Formula::Temporal { op: TemporalOp::Eventually | TemporalOp::Next, .. }
        | Formula::Deontic { op: DeonticOp::Permitted, .. }
        | Formula::Quantified { quantifier: Quantifier::Exists, .. } => 1,
        _ => 0,
    }
}

impl Tableau {
    /// Try to refute `premises ∧ ¬goal`
    pub(crate) fn run(&self, premises: &[Formula], goal: &Formula, meter: &mut Meter) -> TableauVerdict {
        let mut domain = BTreeSet::new();
        for formula in premises.iter().chain(std::iter::once(goal)) {
            domain.extend(formula.constants());
        }

        let mut root = Branch::new(self.logic, self.max_worlds, domain.into_iter().collect());
        for premise in premises {
            root.add(0, premise.clone());
        }
        root.add(0, goal.negation());

        let mut stack = vec![root];
        let mut closed = 0;
        let mut max_worlds = 1;
        let mut incomplete = false;

        while let Some(mut branch) = stack.pop() {
            loop {
                if branch.closed {
                    closed += 1;
                    max_worlds = max_worlds.max(branch.worlds);
                    break;
                }
                if let Err(exhaustion) = meter.charge() {
                    return TableauVerdict::Exhausted(exhaustion);
                }
                match branch.step() {
                    Step::Progress => {}
                    Step::Split(alternatives) => {
                        if stack.len() + alternatives.len() > self.max_branches {
                            debug!("Tableau branch limit {} reached", self.max_branches);
                            incomplete = true;
                            break;
                        }
                        for alternative in alternatives.into_iter().rev() {
                            let mut child = branch.clone();
                            for (world, formula) in alternative {
                                child.add(world, formula);
                            }
                            stack.push(child);
                        }
                        break;
                    }
                    Step::Complete => {
                        if branch.approximated {
                            incomplete = true;
                            break;
                        }
                        debug!("Tableau open branch with {} worlds", branch.worlds);
                        return TableauVerdict::Open { worlds: branch.worlds };
                    }
                }
            }
        }

        if incomplete {
            TableauVerdict::Incomplete
        } else {
            TableauVerdict::Closed { branches: closed, worlds: max_worlds }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::CancellationFlag;
    use crate::parser::parse;
    use std::time::Duration;

    fn run(logic: ModalLogic, premises: &[&str], goal: &str) -> TableauVerdict {
        let premises: Vec<Formula> = premises.iter().map(|p| parse(p).unwrap()).collect();
        let goal = parse(goal).unwrap();
        let tableau = Tableau { logic, max_worlds: 16, max_branches: 256 };
        let mut meter = Meter::new(10_000, Duration::from_secs(5), CancellationFlag::new());
        tableau.run(&premises, &goal, &mut meter)
    }

    #[test]
    fn test_propositional_tautology_closes() {
        assert!(matches!(run(ModalLogic::K, &[], "P ∨ ¬P"), TableauVerdict::Closed { .. }));
    }

    #[test]
    fn test_k_distribution_closes() {
        assert!(matches!(
            run(ModalLogic::K, &["□(P → Q)", "□P"], "□Q"),
            TableauVerdict::Closed { .. }
        ));
    }

    #[test]
    fn test_t_axiom_needs_reflexivity() {
        assert!(matches!(run(ModalLogic::T, &["□P"], "P"), TableauVerdict::Closed { .. }));
        assert!(matches!(run(ModalLogic::K, &["□P"], "P"), TableauVerdict::Open { .. }));
    }

    #[test]
    fn test_axiom_4_in_s4() {
        assert!(matches!(run(ModalLogic::S4, &["□P"], "□□P"), TableauVerdict::Closed { .. }));
    }

    #[test]
    fn test_axiom_5_in_s5() {
        assert!(matches!(run(ModalLogic::S5, &["◊P"], "□◊P"), TableauVerdict::Closed { .. }));
    }

    #[test]
    fn test_deontic_d_needs_seriality() {
        assert!(matches!(run(ModalLogic::D, &["O(P)"], "P(P)"), TableauVerdict::Closed { .. }));
        assert!(matches!(run(ModalLogic::K, &["O(P)"], "P(P)"), TableauVerdict::Open { .. }));
    }

    #[test]
    fn test_obligation_does_not_imply_fact() {
        assert!(matches!(run(ModalLogic::D, &["O(P)"], "P"), TableauVerdict::Open { .. }));
    }

    #[test]
    fn test_quantified_refutation() {
        assert!(matches!(
            run(ModalLogic::K, &["∀x. Human(x) → Mortal(x)", "Human(socrates)"], "Mortal(socrates)"),
            TableauVerdict::Closed { .. }
        ));
    }

    #[test]
    fn test_until_never_disproves() {
        assert_eq!(run(ModalLogic::S4, &["P U Q"], "R"), TableauVerdict::Incomplete);
    }

    #[test]
    fn test_step_budget() {
        let premises = vec![parse("(A ∨ B) ∧ (C ∨ D) ∧ (E ∨ F)").unwrap()];
        let tableau = Tableau { logic: ModalLogic::K, max_worlds: 16, max_branches: 256 };
        let mut meter = Meter::new(2, Duration::from_secs(5), CancellationFlag::new());
        let verdict = tableau.run(&premises, &parse("G").unwrap(), &mut meter);
        assert_eq!(verdict, TableauVerdict::Exhausted(Exhaustion::Steps));
    }
}
