// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Native forward-chaining inference engine
//!
//! Facts are seeded with the axioms. Each round scans the active rules in
//! priority order and applies the first one that derives a new fact,
//! recording a proof step, until the goal is derived, nothing new can be
//! derived, or a budget runs out. When modal operators are involved and
//! forward chaining reaches a fixpoint, a labelled tableau under the
//! selected modal logic gets the final word.
//!
//! The engine is synchronous and single-threaded. Independent proofs run
//! on independent engines; nothing is shared except the cancellation flag.

pub mod modal;
pub mod pattern;
pub mod rules;
pub mod tableau;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::{Formula, KnowledgeBase};
use crate::proof::{Inconsistency, ProofResult, ProofStatus, ProofStep};
use crate::provers::native::NATIVE_PROVER;
use modal::{ModalLogic, ModalStrategySelector};
use rules::{InferenceRule, RuleContext};
use tableau::{Tableau, TableauVerdict};

/// Shared cooperative cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resource limits for one proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Rule applications plus tableau expansions
    pub max_steps: usize,
    pub time: Duration,
}

impl Budget {
    pub fn new(max_steps: usize, time: Duration) -> Self {
        Budget { max_steps, time }
    }

    /// Keep the step limit, never exceed `cap` of wall-clock time
    pub fn capped(self, cap: Duration) -> Self {
        Budget { max_steps: self.max_steps, time: self.time.min(cap) }
    }
}

impl From<&EngineConfig> for Budget {
    fn from(config: &EngineConfig) -> Self {
        Budget::new(config.max_steps, config.time_budget())
    }
}

/// Which budget ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    Steps,
    /// Deadline passed or cancelled
    Time,
}

impl Exhaustion {
    fn status(self) -> ProofStatus {
        match self {
            Exhaustion::Steps => ProofStatus::DepthExceeded,
            Exhaustion::Time => ProofStatus::Timeout,
        }
    }
}

/// Budget accounting shared by forward chaining and the tableau
pub(crate) struct Meter {
    max_steps: usize,
    used: usize,
    deadline: Instant,
    cancel: CancellationFlag,
}

impl Meter {
    pub(crate) fn new(max_steps: usize, time: Duration, cancel: CancellationFlag) -> Self {
        Meter { max_steps, used: 0, deadline: Instant::now() + time, cancel }
    }

    pub(crate) fn check_time(&self) -> Result<(), Exhaustion> {
        if self.cancel.is_cancelled() || Instant::now() >= self.deadline {
            return Err(Exhaustion::Time);
        }
        Ok(())
    }

    /// Consume one step
    pub(crate) fn charge(&mut self) -> Result<(), Exhaustion> {
        self.check_time()?;
        if self.used >= self.max_steps {
            return Err(Exhaustion::Steps);
        }
        self.used += 1;
        Ok(())
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }
}

/// Derived facts in insertion order with O(1) membership
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    order: Vec<Formula>,
    index: HashSet<Formula>,
}

impl FactSet {
    /// Returns false if the fact was already present
    pub fn insert(&mut self, fact: Formula) -> bool {
        if self.index.contains(&fact) {
            return false;
        }
        self.index.insert(fact.clone());
        self.order.push(fact);
        true
    }

    pub fn contains(&self, fact: &Formula) -> bool {
        self.index.contains(fact)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Forward-chaining prover with an optional session knowledge base
pub struct InferenceEngine {
    config: EngineConfig,
    rules: Vec<Box<dyn InferenceRule>>,
    selector: ModalStrategySelector,
    knowledge_base: KnowledgeBase,
    cancel: CancellationFlag,
}

impl InferenceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_knowledge_base(KnowledgeBase::default(), config)
    }

    /// Engine bound to a session knowledge base; see [`InferenceEngine::prove_goal`]
    pub fn with_knowledge_base(knowledge_base: KnowledgeBase, config: EngineConfig) -> Self {
        InferenceEngine {
            selector: ModalStrategySelector::with_override(config.modal_logic),
            rules: rules::standard_rules(),
            config,
            knowledge_base,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Budget from configuration
    pub fn default_budget(&self) -> Budget {
        Budget::from(&self.config)
    }

    /// Prove `goal` from `axioms` alone; the session knowledge base is untouched
    pub fn prove(&self, goal: &Formula, axioms: &[Formula], budget: Budget) -> ProofResult {
        self.run(goal, axioms, budget)
    }

    /// Prove `goal` from the session knowledge base, recording it as a
    /// theorem when proved
    pub fn prove_goal(&mut self, goal: &Formula) -> ProofResult {
        let facts: Vec<Formula> = self.knowledge_base.facts().cloned().collect();
        let result = self.run(goal, &facts, self.default_budget());
        if result.status == ProofStatus::Proved {
            self.knowledge_base.add_theorem(goal.clone());
        }
        result
    }

    fn run(&self, goal: &Formula, axioms: &[Formula], budget: Budget) -> ProofResult {
        let start = Instant::now();
        let finish = |result: ProofResult| result.with_elapsed(start.elapsed());

        if let Some(too_deep) = std::iter::once(goal)
            .chain(axioms.iter())
            .find(|f| f.depth() > self.config.max_formula_depth)
        {
            return finish(
                ProofResult::new(ProofStatus::DepthExceeded, NATIVE_PROVER).with_message(format!(
                    "formula depth {} exceeds limit {}",
                    too_deep.depth(),
                    self.config.max_formula_depth
                )),
            );
        }

        let logic = if ModalStrategySelector::requires_modal(std::iter::once(goal).chain(axioms.iter())) {
            Some(self.selector.select(goal, axioms).logic)
        } else {
            None
        };

        let mut search = Search::new(goal, axioms, logic);
        let mut meter = Meter::new(budget.max_steps, budget.time, self.cancel.clone());
        let active: Vec<&dyn InferenceRule> =
            self.rules.iter().map(|r| r.as_ref()).filter(|r| r.is_active(logic)).collect();

        let mut result = match self.forward_chain(&mut search, &active, &mut meter) {
            Some(status) => ProofResult::new(status, NATIVE_PROVER),
            None => match logic {
                Some(logic) => self.close_with_tableau(&mut search, goal, logic, &mut meter),
                None => ProofResult::new(ProofStatus::Unknown, NATIVE_PROVER)
                    .with_message("forward chaining reached a fixpoint without the goal"),
            },
        };

        match result.status {
            ProofStatus::Proved => info!("Proved {} in {} steps", goal, search.steps.len()),
            status => debug!("Proof of {} ended with {} after {} steps", goal, status, meter.used()),
        }

        result.steps = search.steps;
        result.modal_logic = logic;
        result.inconsistency = search.inconsistency;
        finish(result)
    }

    /// Returns the final status, or `None` at a fixpoint without the goal
    fn forward_chain(
        &self,
        search: &mut Search,
        active: &[&dyn InferenceRule],
        meter: &mut Meter,
    ) -> Option<ProofStatus> {
        if search.facts.contains(&search.goal) {
            return Some(ProofStatus::Proved);
        }

        loop {
            if let Err(exhaustion) = meter.check_time() {
                return Some(exhaustion.status());
            }
            if search.facts.len() >= self.config.max_facts {
                debug!("Fact limit {} reached", self.config.max_facts);
                return Some(ProofStatus::DepthExceeded);
            }

            let derivation = {
                let ctx = RuleContext {
                    facts: &search.facts,
                    targets: &search.targets,
                    domain: &search.domain,
                };
                active.iter().find_map(|rule| rule.apply(&ctx))
            };

            let derivation = match derivation {
                Some(derivation) => derivation,
                None => {
                    debug!("Fixpoint after {} derived facts", search.facts.len());
                    return None;
                }
            };

            if let Err(exhaustion) = meter.charge() {
                return Some(exhaustion.status());
            }

            debug!("{} derived {}", derivation.rule, derivation.conclusion);
            search.record(ProofStep {
                rule: derivation.rule.to_string(),
                premises: derivation.premises,
                conclusion: derivation.conclusion.clone(),
                justification: derivation.justification,
            });

            if derivation.conclusion == search.goal {
                return Some(ProofStatus::Proved);
            }
        }
    }

    fn close_with_tableau(
        &self,
        search: &mut Search,
        goal: &Formula,
        logic: ModalLogic,
        meter: &mut Meter,
    ) -> ProofResult {
        let tableau = Tableau {
            logic,
            max_worlds: self.config.max_worlds,
            max_branches: self.config.max_branches,
        };
        let premises: Vec<Formula> = search.facts.iter().cloned().collect();

        match tableau.run(&premises, goal, meter) {
            TableauVerdict::Closed { branches, worlds } => {
                search.steps.push(ProofStep {
                    rule: "tableau_closure".to_string(),
                    premises,
                    conclusion: goal.clone(),
                    justification: format!(
                        "all {} branches closed under {} ({} worlds)",
                        branches, logic, worlds
                    ),
                });
                ProofResult::new(ProofStatus::Proved, NATIVE_PROVER)
            }
            TableauVerdict::Open { worlds } => ProofResult::new(ProofStatus::Disproved, NATIVE_PROVER)
                .with_message(format!("open tableau branch: counter-model with {} worlds under {}", worlds, logic)),
            TableauVerdict::Incomplete => ProofResult::new(ProofStatus::Unknown, NATIVE_PROVER)
                .with_message("tableau left branches undecided"),
            TableauVerdict::Exhausted(exhaustion) => ProofResult::new(exhaustion.status(), NATIVE_PROVER),
        }
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Per-proof working state
struct Search {
    goal: Formula,
    facts: FactSet,
    targets: Vec<Formula>,
    domain: Vec<crate::core::Term>,
    steps: Vec<ProofStep>,
    inconsistency: Option<Inconsistency>,
}

impl Search {
    fn new(goal: &Formula, axioms: &[Formula], logic: Option<ModalLogic>) -> Self {
        let problem = || std::iter::once(goal).chain(axioms.iter());

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for formula in problem() {
            for sub in formula.subformulas() {
                if seen.insert(sub) {
                    targets.push(sub.clone());
                }
            }
        }

        let mut domain = BTreeSet::new();
        for formula in problem() {
            domain.extend(formula.constants());
        }

        let mut search = Search {
            goal: goal.clone(),
            facts: FactSet::default(),
            targets,
            domain: domain.into_iter().collect(),
            steps: Vec::new(),
            inconsistency: None,
        };
        for axiom in axioms {
            search.add_fact(axiom.clone());
        }
        if logic.is_some() {
            debug!("Modal reasoning engaged under {:?}", logic);
        }
        search
    }

    fn add_fact(&mut self, fact: Formula) {
        if self.inconsistency.is_none() && self.facts.contains(&fact.negation()) {
            let (formula, negation) = match &fact {
                Formula::Not(inner) => (inner.as_ref().clone(), fact.clone()),
                _ => (fact.clone(), fact.negation()),
            };
            debug!("Inconsistent facts: {} and {}", formula, negation);
            self.inconsistency = Some(Inconsistency { formula, negation });
        }
        self.facts.insert(fact);
    }

    fn record(&mut self, step: ProofStep) {
        self.add_fact(step.conclusion.clone());
        self.steps.push(step);
    }
}
