// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inference rules for the forward-chaining engine
//!
//! Rules are grouped into families and tried in a fixed order:
//! propositional, quantifier, temporal, deontic, combined. Within a
//! family the order below is the order of application.
//!
//! Forward rules match their premises against the current facts.
//! Goal-directed rules (introductions, schema axioms whose conclusion is
//! larger than their premise) first match their conclusion against a
//! target subformula of the problem, so they never invent formulas that
//! are not part of it.

use serde::{Deserialize, Serialize};

use super::modal::ModalLogic;
use super::pattern::{self, meta, Bindings, Pattern};
use super::FactSet;
use crate::core::{Formula, Quantifier, Term};

/// Rule families in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleFamily {
    Propositional,
    Quantifier,
    Temporal,
    Deontic,
    Combined,
}

/// A single rule application producing a new fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub rule: &'static str,
    pub premises: Vec<Formula>,
    pub conclusion: Formula,
    pub justification: String,
}

/// What a rule may look at while searching for an application
pub struct RuleContext<'a> {
    pub facts: &'a FactSet,

    /// Subformulas of the goal and axioms, deduplicated, in first-seen order
    pub targets: &'a [Formula],

    /// Ground constants of the problem, sorted
    pub domain: &'a [Term],
}

pub trait InferenceRule: Send + Sync {
    /// Stable name used in proof traces
    fn name(&self) -> &'static str;

    fn family(&self) -> RuleFamily;

    /// Whether the rule is sound under the selected modal logic
    /// (`None` when no modal reasoning is engaged)
    fn is_active(&self, logic: Option<ModalLogic>) -> bool;

    /// First application whose conclusion is not yet a fact
    fn apply(&self, ctx: &RuleContext<'_>) -> Option<Derivation>;
}

/// Frame condition gating a schema rule
type FrameCondition = fn(&ModalLogic) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Forward,
    GoalDirected,
}

/// Rule given by premise patterns and a conclusion template
pub struct SchemaRule {
    name: &'static str,
    family: RuleFamily,
    mode: Mode,
    premises: Vec<Pattern>,
    conclusion: Pattern,
    frame: Option<FrameCondition>,
    justification: &'static str,
}

impl SchemaRule {
    fn forward(
        name: &'static str,
        family: RuleFamily,
        premises: Vec<Pattern>,
        conclusion: Pattern,
        justification: &'static str,
    ) -> Self {
        SchemaRule { name, family, mode: Mode::Forward, premises, conclusion, frame: None, justification }
    }

    fn goal_directed(
        name: &'static str,
        family: RuleFamily,
        premises: Vec<Pattern>,
        conclusion: Pattern,
        justification: &'static str,
    ) -> Self {
        SchemaRule { name, family, mode: Mode::GoalDirected, premises, conclusion, frame: None, justification }
    }

    fn when(mut self, frame: FrameCondition) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Depth-first search over premise assignments in fact order
    fn search(
        &self,
        index: usize,
        bindings: &Bindings,
        chosen: &mut Vec<Formula>,
        facts: &FactSet,
    ) -> Option<Derivation> {
        if index == self.premises.len() {
            let conclusion = self.conclusion.instantiate(bindings)?;
            if facts.contains(&conclusion) {
                return None;
            }
            return Some(Derivation {
                rule: self.name,
                premises: chosen.clone(),
                conclusion,
                justification: self.justification.to_string(),
            });
        }

        let premise = &self.premises[index];

        // A fully bound premise is a membership test, not a scan.
        if let Some(required) = premise.instantiate(bindings) {
            if !facts.contains(&required) {
                return None;
            }
            chosen.push(required);
            let found = self.search(index + 1, bindings, chosen, facts);
            chosen.pop();
            return found;
        }

        for fact in facts.iter() {
            if let Some(extended) = premise.match_with(fact, bindings) {
                chosen.push(fact.clone());
                let found = self.search(index + 1, &extended, chosen, facts);
                chosen.pop();
                if found.is_some() {
                    return found;
                }
            }
        }
        None
    }
}

impl InferenceRule for SchemaRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn family(&self) -> RuleFamily {
        self.family
    }

    fn is_active(&self, logic: Option<ModalLogic>) -> bool {
        match self.frame {
            None => true,
            Some(condition) => logic.map_or(false, |l| condition(&l)),
        }
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<Derivation> {
        let mut chosen = Vec::with_capacity(self.premises.len());
        match self.mode {
            Mode::Forward => self.search(0, &Bindings::new(), &mut chosen, ctx.facts),
            Mode::GoalDirected => ctx.targets.iter().find_map(|target| {
                if ctx.facts.contains(target) {
                    return None;
                }
                let bindings = self.conclusion.match_with(target, &Bindings::new())?;
                self.search(0, &bindings, &mut chosen, ctx.facts)
            }),
        }
    }
}

/// ∀x. φ ⊢ φ[x := c] for every constant c of the problem
pub struct UniversalInstantiation;

impl InferenceRule for UniversalInstantiation {
    fn name(&self) -> &'static str {
        "universal_instantiation"
    }

    fn family(&self) -> RuleFamily {
        RuleFamily::Quantifier
    }

    fn is_active(&self, _logic: Option<ModalLogic>) -> bool {
        true
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<Derivation> {
        for fact in ctx.facts.iter() {
            let (variable, body) = match fact {
                Formula::Quantified { quantifier: Quantifier::Forall, variable, body } => (variable, body),
                _ => continue,
            };
            for constant in ctx.domain {
                let instance = body.substitute(variable, constant);
                if !ctx.facts.contains(&instance) {
                    return Some(Derivation {
                        rule: self.name(),
                        premises: vec![fact.clone()],
                        conclusion: instance,
                        justification: format!("instantiate {} with {}", variable, constant),
                    });
                }
            }
        }
        None
    }
}

/// φ[x := c] ⊢ ∃x. φ, only for existential targets of the problem
pub struct ExistentialGeneralization;

impl InferenceRule for ExistentialGeneralization {
    fn name(&self) -> &'static str {
        "existential_generalization"
    }

    fn family(&self) -> RuleFamily {
        RuleFamily::Quantifier
    }

    fn is_active(&self, _logic: Option<ModalLogic>) -> bool {
        true
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<Derivation> {
        for target in ctx.targets {
            let (variable, body) = match target {
                Formula::Quantified { quantifier: Quantifier::Exists, variable, body } => (variable, body),
                _ => continue,
            };
            if ctx.facts.contains(target) {
                continue;
            }
            for constant in ctx.domain {
                let witness = body.substitute(variable, constant);
                if ctx.facts.contains(&witness) {
                    return Some(Derivation {
                        rule: self.name(),
                        premises: vec![witness],
                        conclusion: target.clone(),
                        justification: format!("{} witnesses {}", constant, variable),
                    });
                }
            }
        }
        None
    }
}

fn propositional_rules() -> Vec<Box<dyn InferenceRule>> {
    use pattern::{and, iff, implies, not, or, xor};
    use RuleFamily::Propositional as Fam;
    let (a, b, c) = (|| meta("A"), || meta("B"), || meta("C"));

    vec![
        Box::new(SchemaRule::forward(
            "modus_ponens",
            Fam,
            vec![implies(a(), b()), a()],
            b(),
            "from A → B and A infer B",
        )),
        Box::new(SchemaRule::forward(
            "modus_tollens",
            Fam,
            vec![implies(a(), b()), not(b())],
            not(a()),
            "from A → B and ¬B infer ¬A",
        )),
        Box::new(SchemaRule::forward(
            "hypothetical_syllogism",
            Fam,
            vec![implies(a(), b()), implies(b(), c())],
            implies(a(), c()),
            "chain A → B and B → C",
        )),
        Box::new(SchemaRule::forward(
            "disjunctive_syllogism",
            Fam,
            vec![or(a(), b()), not(a())],
            b(),
            "from A ∨ B and ¬A infer B",
        )),
        Box::new(SchemaRule::forward(
            "disjunctive_syllogism_right",
            Fam,
            vec![or(a(), b()), not(b())],
            a(),
            "from A ∨ B and ¬B infer A",
        )),
        Box::new(SchemaRule::forward(
            "and_elimination_left",
            Fam,
            vec![and(a(), b())],
            a(),
            "from A ∧ B infer A",
        )),
        Box::new(SchemaRule::forward(
            "and_elimination_right",
            Fam,
            vec![and(a(), b())],
            b(),
            "from A ∧ B infer B",
        )),
        Box::new(SchemaRule::forward(
            "double_negation_elimination",
            Fam,
            vec![not(not(a()))],
            a(),
            "from ¬¬A infer A",
        )),
        Box::new(SchemaRule::forward(
            "biconditional_elimination_left",
            Fam,
            vec![iff(a(), b())],
            implies(a(), b()),
            "from A ↔ B infer A → B",
        )),
        Box::new(SchemaRule::forward(
            "biconditional_elimination_right",
            Fam,
            vec![iff(a(), b())],
            implies(b(), a()),
            "from A ↔ B infer B → A",
        )),
        Box::new(SchemaRule::forward(
            "xor_elimination",
            Fam,
            vec![xor(a(), b()), a()],
            not(b()),
            "from A ⊕ B and A infer ¬B",
        )),
        Box::new(SchemaRule::forward(
            "xor_elimination_right",
            Fam,
            vec![xor(a(), b()), b()],
            not(a()),
            "from A ⊕ B and B infer ¬A",
        )),
        Box::new(SchemaRule::forward(
            "de_morgan_and",
            Fam,
            vec![not(and(a(), b()))],
            or(not(a()), not(b())),
            "¬(A ∧ B) is ¬A ∨ ¬B",
        )),
        Box::new(SchemaRule::forward(
            "de_morgan_or",
            Fam,
            vec![not(or(a(), b()))],
            and(not(a()), not(b())),
            "¬(A ∨ B) is ¬A ∧ ¬B",
        )),
        Box::new(SchemaRule::goal_directed(
            "and_introduction",
            Fam,
            vec![a(), b()],
            and(a(), b()),
            "from A and B infer A ∧ B",
        )),
        Box::new(SchemaRule::goal_directed(
            "or_introduction_left",
            Fam,
            vec![a()],
            or(a(), b()),
            "from A infer A ∨ B",
        )),
        Box::new(SchemaRule::goal_directed(
            "or_introduction_right",
            Fam,
            vec![b()],
            or(a(), b()),
            "from B infer A ∨ B",
        )),
        Box::new(SchemaRule::goal_directed(
            "biconditional_introduction",
            Fam,
            vec![implies(a(), b()), implies(b(), a())],
            iff(a(), b()),
            "from A → B and B → A infer A ↔ B",
        )),
    ]
}

fn quantifier_rules() -> Vec<Box<dyn InferenceRule>> {
    vec![Box::new(UniversalInstantiation), Box::new(ExistentialGeneralization)]
}

fn temporal_rules() -> Vec<Box<dyn InferenceRule>> {
    use pattern::{always, and, eventually, implies, not, until};
    use RuleFamily::Temporal as Fam;
    let (a, b) = (|| meta("A"), || meta("B"));

    vec![
        Box::new(SchemaRule::forward(
            "temporal_k",
            Fam,
            vec![always(implies(a(), b())), always(a())],
            always(b()),
            "K: □(A → B), □A ⊢ □B",
        )),
        Box::new(
            SchemaRule::forward("temporal_t", Fam, vec![always(a())], a(), "T: □A ⊢ A")
                .when(ModalLogic::is_reflexive),
        ),
        Box::new(
            SchemaRule::forward("temporal_d", Fam, vec![always(a())], eventually(a()), "D: □A ⊢ ◊A")
                .when(ModalLogic::is_serial),
        ),
        Box::new(
            SchemaRule::goal_directed("temporal_4", Fam, vec![always(a())], always(always(a())), "4: □A ⊢ □□A")
                .when(ModalLogic::is_transitive),
        ),
        Box::new(
            SchemaRule::goal_directed(
                "temporal_5",
                Fam,
                vec![eventually(a())],
                always(eventually(a())),
                "5: ◊A ⊢ □◊A",
            )
            .when(ModalLogic::is_symmetric),
        ),
        Box::new(
            SchemaRule::goal_directed("temporal_t_possibility", Fam, vec![a()], eventually(a()), "T: A ⊢ ◊A")
                .when(ModalLogic::is_reflexive),
        ),
        Box::new(SchemaRule::forward(
            "always_and_left",
            Fam,
            vec![always(and(a(), b()))],
            always(a()),
            "□(A ∧ B) ⊢ □A",
        )),
        Box::new(SchemaRule::forward(
            "always_and_right",
            Fam,
            vec![always(and(a(), b()))],
            always(b()),
            "□(A ∧ B) ⊢ □B",
        )),
        Box::new(SchemaRule::forward(
            "until_eventually",
            Fam,
            vec![until(a(), b())],
            eventually(b()),
            "A U B ⊢ ◊B",
        )),
        Box::new(SchemaRule::forward(
            "not_always_duality",
            Fam,
            vec![not(always(a()))],
            eventually(not(a())),
            "¬□A ⊢ ◊¬A",
        )),
        Box::new(SchemaRule::forward(
            "not_eventually_duality",
            Fam,
            vec![not(eventually(a()))],
            always(not(a())),
            "¬◊A ⊢ □¬A",
        )),
    ]
}

fn deontic_rules() -> Vec<Box<dyn InferenceRule>> {
    use pattern::{forbidden, implies, not, obligatory, permitted};
    use RuleFamily::Deontic as Fam;
    let (a, b) = (|| meta("A"), || meta("B"));

    vec![
        Box::new(SchemaRule::forward(
            "deontic_k",
            Fam,
            vec![obligatory(implies(a(), b())), obligatory(a())],
            obligatory(b()),
            "K: O(A → B), O(A) ⊢ O(B)",
        )),
        Box::new(
            SchemaRule::forward(
                "deontic_d",
                Fam,
                vec![obligatory(a())],
                permitted(a()),
                "D: O(A) ⊢ P(A)",
            )
            .when(ModalLogic::is_serial),
        ),
        Box::new(SchemaRule::forward(
            "prohibition_as_obligation",
            Fam,
            vec![forbidden(a())],
            obligatory(not(a())),
            "F(A) ⊢ O(¬A)",
        )),
        Box::new(SchemaRule::forward(
            "obligation_as_prohibition",
            Fam,
            vec![obligatory(not(a()))],
            forbidden(a()),
            "O(¬A) ⊢ F(A)",
        )),
        Box::new(SchemaRule::forward(
            "non_permission_as_prohibition",
            Fam,
            vec![not(permitted(a()))],
            forbidden(a()),
            "¬P(A) ⊢ F(A)",
        )),
        Box::new(SchemaRule::goal_directed(
            "permission_duality",
            Fam,
            vec![not(forbidden(a()))],
            permitted(a()),
            "¬F(A) ⊢ P(A)",
        )),
    ]
}

fn combined_rules() -> Vec<Box<dyn InferenceRule>> {
    use pattern::{always, implies, obligatory};
    use RuleFamily::Combined as Fam;
    let (a, b) = (|| meta("A"), || meta("B"));

    vec![
        Box::new(SchemaRule::forward(
            "always_obligation_k",
            Fam,
            vec![always(obligatory(implies(a(), b()))), always(obligatory(a()))],
            always(obligatory(b())),
            "□O(A → B), □O(A) ⊢ □O(B)",
        )),
        Box::new(SchemaRule::forward(
            "always_obligation_now",
            Fam,
            vec![always(obligatory(a()))],
            obligatory(a()),
            "a standing obligation holds now: □O(A) ⊢ O(A)",
        )),
    ]
}

/// Every rule in application order
pub fn standard_rules() -> Vec<Box<dyn InferenceRule>> {
    let mut rules = propositional_rules();
    rules.extend(quantifier_rules());
    rules.extend(temporal_rules());
    rules.extend(deontic_rules());
    rules.extend(combined_rules());
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn facts(texts: &[&str]) -> FactSet {
        let mut set = FactSet::default();
        for text in texts {
            set.insert(parse(text).unwrap());
        }
        set
    }

    fn rule(name: &str) -> Box<dyn InferenceRule> {
        standard_rules().into_iter().find(|r| r.name() == name).unwrap()
    }

    fn apply(name: &str, facts: &FactSet, targets: &[Formula], domain: &[Term]) -> Option<Derivation> {
        rule(name).apply(&RuleContext { facts, targets, domain })
    }

    #[test]
    fn test_rule_names_are_unique() {
        let rules = standard_rules();
        let mut names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_families_are_in_priority_order() {
        let families: Vec<RuleFamily> = standard_rules().iter().map(|r| r.family()).collect();
        let mut sorted = families.clone();
        sorted.sort();
        assert_eq!(families, sorted);
    }

    #[test]
    fn test_modus_ponens() {
        let set = facts(&["P", "P -> Q"]);
        let derivation = apply("modus_ponens", &set, &[], &[]).unwrap();
        assert_eq!(derivation.conclusion, parse("Q").unwrap());
        assert_eq!(derivation.premises, vec![parse("P -> Q").unwrap(), parse("P").unwrap()]);
    }

    #[test]
    fn test_known_conclusions_are_skipped() {
        let set = facts(&["P", "P -> Q", "Q"]);
        assert!(apply("modus_ponens", &set, &[], &[]).is_none());
    }

    #[test]
    fn test_and_introduction_is_goal_directed() {
        let set = facts(&["A", "B"]);
        assert!(apply("and_introduction", &set, &[], &[]).is_none());
        let target = parse("A ∧ B").unwrap();
        let derivation = apply("and_introduction", &set, &[target.clone()], &[]).unwrap();
        assert_eq!(derivation.conclusion, target);
    }

    #[test]
    fn test_universal_instantiation_uses_domain() {
        let set = facts(&["∀x. Human(x) → Mortal(x)"]);
        let domain = vec![Term::constant("socrates")];
        let derivation = apply("universal_instantiation", &set, &[], &domain).unwrap();
        assert_eq!(derivation.conclusion, parse("Human(socrates) → Mortal(socrates)").unwrap());
    }

    #[test]
    fn test_existential_generalization() {
        let set = facts(&["Mortal(socrates)"]);
        let target = parse("∃x. Mortal(x)").unwrap();
        let domain = vec![Term::constant("socrates")];
        let derivation = apply("existential_generalization", &set, &[target.clone()], &domain).unwrap();
        assert_eq!(derivation.conclusion, target);
    }

    #[test]
    fn test_frame_gating() {
        let t = rule("temporal_t");
        assert!(!t.is_active(None));
        assert!(!t.is_active(Some(ModalLogic::K)));
        assert!(t.is_active(Some(ModalLogic::S4)));
        assert!(rule("deontic_d").is_active(Some(ModalLogic::D)));
        assert!(!rule("temporal_5").is_active(Some(ModalLogic::S4)));
        assert!(rule("temporal_5").is_active(Some(ModalLogic::S5)));
        assert!(rule("modus_ponens").is_active(None));
    }

    #[test]
    fn test_deontic_k() {
        let set = facts(&["O(P)", "O(P -> Q)"]);
        let derivation = apply("deontic_k", &set, &[], &[]).unwrap();
        assert_eq!(derivation.conclusion, parse("O(Q)").unwrap());
    }
}
