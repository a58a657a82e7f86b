// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Noesis: a neurosymbolic reasoning core
//!
//! Parses first-order formulas with deontic and temporal operators, proves
//! them with a native forward-chaining engine backed by a modal tableau,
//! analyzes their complexity, caches results by content digest, and routes
//! problems across pluggable prover capabilities.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod inference;
pub mod parser;
pub mod proof;
pub mod provers;
pub mod router;
pub mod telemetry;

pub use analyzer::{FormulaAnalysis, FormulaAnalyzer, FormulaType};
pub use cache::{CacheKey, CacheStats, ProofCache};
pub use config::CoreConfig;
pub use core::{Formula, KnowledgeBase, Term};
pub use error::{ConfigError, ParseError, RouterError};
pub use inference::modal::{ModalLogic, ModalStrategySelector};
pub use inference::{Budget, CancellationFlag, InferenceEngine};
pub use parser::{parse, serialize, FormulaParser};
pub use proof::{ProofResult, ProofStatus, ProofStep};
pub use provers::{NativeProver, ProverCapabilities, ProverCapability, ProverRegistry};
pub use router::{ProverRouter, SelectionStrategy};
