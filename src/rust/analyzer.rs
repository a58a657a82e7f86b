// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Formula analysis for strategy selection
//!
//! Classifies a formula's logical fragment, scores its complexity and
//! ranks provers for it. Classification is rule-based; the prover ranking
//! is a configurable table keyed by (type, complexity bucket).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::{DeonticOp, Formula, TemporalOp, Term};
use crate::error::ConfigError;

/// Logical fragment of a formula
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaType {
    /// First-order with at most one level of quantifier nesting
    FOL,
    /// `□`/`◊` only
    Modal,
    /// Any `X`, `U` or `S`
    Temporal,
    Deontic,
    /// Deontic together with temporal or modal operators
    Mixed,
    /// Uses arithmetic predicates, functions or numerals
    Arithmetic,
    /// Nested quantifiers
    Quantified,
    Propositional,
}

impl std::fmt::Display for FormulaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexityBucket {
    Low,
    Medium,
    High,
}

/// Operator occurrence counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCounts {
    pub predicates: usize,
    pub negations: usize,
    pub connectives: usize,
    pub quantifiers: usize,
    pub obligations: usize,
    pub permissions: usize,
    pub prohibitions: usize,
    /// `□` and `◊`
    pub modal: usize,
    /// `X`, `U` and `S`
    pub temporal: usize,
}

impl OperatorCounts {
    pub fn deontic(&self) -> usize {
        self.obligations + self.permissions + self.prohibitions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaAnalysis {
    pub formula_type: FormulaType,
    /// 0-100
    pub complexity_score: u8,
    pub bucket: ComplexityBucket,
    /// Maximum quantifier nesting
    pub quantifier_depth: usize,
    /// Maximum operator nesting
    pub nesting_level: usize,
    pub size: usize,
    pub operators: OperatorCounts,
    /// Prover identities, best first
    pub recommended_provers: Vec<String>,
}

/// One row of the recommendation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub formula_type: FormulaType,
    /// `None` matches every bucket
    #[serde(default)]
    pub bucket: Option<ComplexityBucket>,
    pub provers: Vec<String>,
}

/// (type, bucket) → ranked provers; first matching row wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverMapping {
    pub rules: Vec<MappingRule>,
    pub fallback: Vec<String>,
}

impl ProverMapping {
    pub fn lookup(&self, formula_type: FormulaType, bucket: ComplexityBucket) -> &[String] {
        self.rules
            .iter()
            .find(|rule| rule.formula_type == formula_type && rule.bucket.map_or(true, |b| b == bucket))
            .map(|rule| rule.provers.as_slice())
            .unwrap_or(self.fallback.as_slice())
    }
}

fn row(formula_type: FormulaType, bucket: Option<ComplexityBucket>, provers: &[&str]) -> MappingRule {
    MappingRule { formula_type, bucket, provers: provers.iter().map(|p| p.to_string()).collect() }
}

impl Default for ProverMapping {
    fn default() -> Self {
        use ComplexityBucket::*;
        use FormulaType::*;

        ProverMapping {
            rules: vec![
                row(Propositional, Some(Low), &["native", "z3", "cvc5"]),
                row(Propositional, None, &["z3", "native", "cvc5"]),
                row(FOL, Some(Low), &["native", "vampire", "z3"]),
                row(FOL, None, &["vampire", "z3", "native"]),
                row(Quantified, None, &["vampire", "cvc5", "z3", "native"]),
                row(Arithmetic, None, &["z3", "cvc5", "native"]),
                row(Modal, Some(High), &["isabelle", "lean", "native"]),
                row(Modal, None, &["native", "isabelle", "lean"]),
                row(Temporal, Some(High), &["isabelle", "coq", "native"]),
                row(Temporal, None, &["native", "isabelle", "coq"]),
                row(Deontic, Some(High), &["isabelle", "native"]),
                row(Deontic, None, &["native", "isabelle"]),
                row(Mixed, Some(High), &["isabelle", "coq", "lean", "native"]),
                row(Mixed, None, &["native", "isabelle", "coq"]),
            ],
            fallback: vec!["native".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Scores below this are `Low`
    pub low_threshold: u8,
    /// Scores at or above this are `High`
    pub high_threshold: u8,
    /// Predicate and function names treated as arithmetic (case-insensitive)
    pub arithmetic_symbols: Vec<String>,
    pub prover_mapping: ProverMapping,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let arithmetic = [
            "add", "sub", "mul", "div", "mod", "plus", "minus", "times", "succ", "pred", "lt", "le",
            "gt", "ge", "less", "greater", "leq", "geq", "sum", "product", "even", "odd", "prime",
            "divides",
        ];
        AnalyzerConfig {
            low_threshold: 30,
            high_threshold: 60,
            arithmetic_symbols: arithmetic.iter().map(|s| s.to_string()).collect(),
            prover_mapping: ProverMapping::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low_threshold >= self.high_threshold || self.high_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "analyzer thresholds must satisfy low < high <= 100 (got {} and {})",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.prover_mapping.fallback.is_empty() {
            return Err(ConfigError::Invalid("analyzer.prover_mapping.fallback is empty".to_string()));
        }
        if let Some(rule) = self.prover_mapping.rules.iter().find(|r| r.provers.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "analyzer mapping row for {} lists no provers",
                rule.formula_type
            )));
        }
        Ok(())
    }
}

// Complexity weights
const WEIGHT_NODE: f64 = 0.5;
const WEIGHT_NESTING: f64 = 2.0;
const WEIGHT_QUANTIFIER: f64 = 3.0;
const WEIGHT_QUANTIFIER_DEPTH: f64 = 8.0;
const WEIGHT_DEONTIC: f64 = 4.0;
const WEIGHT_MODAL: f64 = 4.0;
const WEIGHT_TEMPORAL: f64 = 5.0;

/// Running totals over one or more formulas
#[derive(Default)]
struct Profile {
    counts: OperatorCounts,
    quantifier_depth: usize,
    nesting_level: usize,
    size: usize,
    arithmetic: bool,
    has_arguments: bool,
}

pub struct FormulaAnalyzer {
    config: AnalyzerConfig,
    arithmetic: HashSet<String>,
}

impl FormulaAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let arithmetic = config.arithmetic_symbols.iter().map(|s| s.to_lowercase()).collect();
        FormulaAnalyzer { config, arithmetic }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a formula. Pure and linear in the formula's size.
    pub fn analyze(&self, formula: &Formula) -> FormulaAnalysis {
        let mut profile = Profile::default();
        self.observe(formula, &mut profile);
        self.conclude(profile)
    }

    /// Analyze a goal together with its axioms. Each formula is walked on
    /// its own: counts and sizes add up, depths take the maximum, and the
    /// fragment is the widest one present.
    pub fn analyze_problem(&self, goal: &Formula, axioms: &[Formula]) -> FormulaAnalysis {
        let mut profile = Profile::default();
        for formula in std::iter::once(goal).chain(axioms) {
            self.observe(formula, &mut profile);
        }
        self.conclude(profile)
    }

    fn observe(&self, formula: &Formula, profile: &mut Profile) {
        let counts = &mut profile.counts;

        // (node, operators above it, quantifiers above it)
        let mut stack = vec![(formula, 0usize, 0usize)];
        while let Some((node, nesting, quantifiers)) = stack.pop() {
            profile.size += 1;
            profile.nesting_level = profile.nesting_level.max(nesting);
            let mut quantifiers = quantifiers;

            match node {
                Formula::Predicate { name, args } => {
                    counts.predicates += 1;
                    profile.has_arguments |= !args.is_empty();
                    profile.arithmetic |=
                        self.is_arithmetic_symbol(name) || args.iter().any(|a| self.is_arithmetic_term(a));
                }
                Formula::Not(_) => counts.negations += 1,
                Formula::Binary { .. } => counts.connectives += 1,
                Formula::Quantified { .. } => {
                    counts.quantifiers += 1;
                    quantifiers += 1;
                    profile.quantifier_depth = profile.quantifier_depth.max(quantifiers);
                }
                Formula::Deontic { op: DeonticOp::Obligatory, .. } => counts.obligations += 1,
                Formula::Deontic { op: DeonticOp::Permitted, .. } => counts.permissions += 1,
                Formula::Deontic { op: DeonticOp::Forbidden, .. } => counts.prohibitions += 1,
                Formula::Temporal { op: TemporalOp::Next, .. } => counts.temporal += 1,
                Formula::Temporal { .. } => counts.modal += 1,
                Formula::BinaryTemporal { .. } => counts.temporal += 1,
            }

            for child in node.children() {
                stack.push((child, nesting + 1, quantifiers));
            }
        }
    }

    fn conclude(&self, profile: Profile) -> FormulaAnalysis {
        let Profile { counts, quantifier_depth, nesting_level, size, arithmetic, has_arguments } = profile;

        let formula_type = if counts.deontic() > 0 && (counts.modal > 0 || counts.temporal > 0) {
            FormulaType::Mixed
        } else if counts.deontic() > 0 {
            FormulaType::Deontic
        } else if counts.temporal > 0 {
            FormulaType::Temporal
        } else if counts.modal > 0 {
            FormulaType::Modal
        } else if arithmetic {
            FormulaType::Arithmetic
        } else if quantifier_depth >= 2 {
            FormulaType::Quantified
        } else if counts.quantifiers > 0 || has_arguments {
            FormulaType::FOL
        } else {
            FormulaType::Propositional
        };

        let raw = WEIGHT_NODE * size as f64
            + WEIGHT_NESTING * nesting_level as f64
            + WEIGHT_QUANTIFIER * counts.quantifiers as f64
            + WEIGHT_QUANTIFIER_DEPTH * quantifier_depth as f64
            + WEIGHT_DEONTIC * counts.deontic() as f64
            + WEIGHT_MODAL * counts.modal as f64
            + WEIGHT_TEMPORAL * counts.temporal as f64;
        let complexity_score = raw.round().clamp(0.0, 100.0) as u8;
        let bucket = self.bucket(complexity_score);

        let recommended_provers = self.config.prover_mapping.lookup(formula_type, bucket).to_vec();

        FormulaAnalysis {
            formula_type,
            complexity_score,
            bucket,
            quantifier_depth,
            nesting_level,
            size,
            operators: counts,
            recommended_provers,
        }
    }

    pub fn bucket(&self, score: u8) -> ComplexityBucket {
        if score < self.config.low_threshold {
            ComplexityBucket::Low
        } else if score < self.config.high_threshold {
            ComplexityBucket::Medium
        } else {
            ComplexityBucket::High
        }
    }

    fn is_arithmetic_symbol(&self, name: &str) -> bool {
        self.arithmetic.contains(&name.to_lowercase())
    }

    fn is_arithmetic_term(&self, term: &Term) -> bool {
        match term {
            Term::Constant(name) => !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()),
            Term::Variable(_) => false,
            Term::Function { name, args } => {
                self.is_arithmetic_symbol(name) || args.iter().any(|a| self.is_arithmetic_term(a))
            }
        }
    }
}

impl Default for FormulaAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
