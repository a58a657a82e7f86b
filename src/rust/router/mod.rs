// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prover routing
//!
//! Analyzes a problem, ranks the registered provers, and dispatches to
//! them under a selection strategy. Every candidate call goes through the
//! proof cache first.

pub mod portfolio;
pub mod strategy;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::analyzer::{FormulaAnalysis, FormulaAnalyzer};
use crate::cache::{CacheKey, ProofCache};
use crate::config::{CoreConfig, RouterConfig};
use crate::core::Formula;
use crate::error::{ConfigError, RouterError};
use crate::inference::CancellationFlag;
use crate::parser::FormulaParser;
use crate::proof::{ProofResult, ProofStatus};
use crate::provers::{NativeProver, ProverCapability, ProverRegistry};
use portfolio::{race, RaceMode};

pub use portfolio::{reconcile, Agreement, Reconciliation};
pub use strategy::SelectionStrategy;

/// Name reported by aggregate results of a parallel race
pub const PARALLEL_PROVER: &str = "parallel";

/// Per-prover performance counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProverStats {
    /// Calls that reached the prover (cache hits excluded)
    pub attempts: u32,

    /// Calls ending in `Proved` or `Disproved`
    pub successes: u32,

    /// Everything else, including timeouts and structural failures
    pub failures: u32,

    pub total_time_ms: u64,
}

impl ProverStats {
    /// Success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    /// Average time per attempt (milliseconds)
    pub fn avg_time_ms(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.total_time_ms as f64 / self.attempts as f64
        }
    }

    fn record(&mut self, success: bool, elapsed: Duration) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_time_ms += elapsed.as_millis() as u64;
    }
}

/// Result of one candidate call
enum Attempt {
    Answered(ProofResult),
    /// Unavailable or structurally failed
    Failed { prover: String, reason: String },
}

impl Attempt {
    fn into_result(self) -> ProofResult {
        match self {
            Attempt::Answered(result) => result,
            Attempt::Failed { prover, reason } => ProofResult::error(prover, reason),
        }
    }
}

/// Cache-fronted prover calls; cheap to clone into spawned tasks
#[derive(Clone)]
struct Dispatcher {
    cache: Arc<ProofCache>,
    stats: Arc<RwLock<HashMap<String, ProverStats>>>,
}

impl Dispatcher {
    async fn call(
        &self,
        prover: Arc<dyn ProverCapability>,
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
        cancel: CancellationFlag,
    ) -> Attempt {
        let name = prover.name().to_string();
        if !prover.is_available() {
            debug!("{} is unavailable", name);
            return Attempt::Failed { prover: name, reason: "prover reports unavailable".to_string() };
        }

        let start = Instant::now();
        let key = CacheKey::new(goal, axioms, &name, &prover.config_fingerprint());
        if let Some(hit) = self.cache.get(&key) {
            debug!("{} answered from cache ({})", name, hit.status);
            return Attempt::Answered(hit.with_elapsed(start.elapsed()));
        }

        debug!("Dispatching to {} with timeout {:?}", name, timeout);
        let outcome = tokio::time::timeout(timeout, prover.prove_cancellable(goal, axioms, timeout, cancel)).await;
        let elapsed = start.elapsed();

        let attempt = match outcome {
            Ok(Ok(mut result)) => {
                // Results are attributed to the registry name
                result.prover_used = name.clone();
                result.from_cache = false;
                if result.status.is_cacheable() {
                    self.cache.put(key, result.clone(), None);
                }
                Attempt::Answered(result)
            }
            Ok(Err(err)) => {
                warn!("{} failed: {:#}", name, err);
                Attempt::Failed { prover: name.clone(), reason: format!("{:#}", err) }
            }
            Err(_) => {
                debug!("{} timed out after {:?}", name, timeout);
                Attempt::Answered(
                    ProofResult::new(ProofStatus::Timeout, name.clone())
                        .with_elapsed(elapsed)
                        .with_message(format!("no answer within {:?}", timeout)),
                )
            }
        };

        let success = matches!(&attempt, Attempt::Answered(r) if r.status.is_decisive());
        self.stats.write().await.entry(name).or_default().record(success, elapsed);
        attempt
    }
}

/// Strategy-driven dispatch over a prover registry
pub struct ProverRouter {
    registry: ProverRegistry,
    analyzer: FormulaAnalyzer,
    parser: FormulaParser,
    dispatcher: Dispatcher,
    config: RouterConfig,
}

impl ProverRouter {
    pub fn new(
        registry: ProverRegistry,
        analyzer: FormulaAnalyzer,
        cache: Arc<ProofCache>,
        config: RouterConfig,
    ) -> Self {
        ProverRouter {
            registry,
            analyzer,
            parser: FormulaParser::default(),
            dispatcher: Dispatcher { cache, stats: Arc::new(RwLock::new(HashMap::new())) },
            config,
        }
    }

    /// Router with the native prover, a fresh cache and everything else
    /// taken from `config`
    pub fn from_config(config: &CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = ProverRegistry::with_native(NativeProver::new(config.engine.clone()));
        let cache = Arc::new(ProofCache::new(config.cache.clone())?);
        let analyzer = FormulaAnalyzer::new(config.analyzer.clone());
        let mut router = Self::new(registry, analyzer, cache, config.router.clone());
        router.parser = FormulaParser::new(config.parser.clone());
        Ok(router)
    }

    pub fn registry(&self) -> &ProverRegistry {
        &self.registry
    }

    pub fn register(&mut self, prover: Arc<dyn ProverCapability>) {
        self.registry.register(prover);
    }

    pub fn analyzer(&self) -> &FormulaAnalyzer {
        &self.analyzer
    }

    pub fn cache(&self) -> &Arc<ProofCache> {
        &self.dispatcher.cache
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Snapshot of per-prover counters
    pub async fn stats(&self) -> HashMap<String, ProverStats> {
        self.dispatcher.stats.read().await.clone()
    }

    /// Available provers ranked by the analysis, then the remaining
    /// available provers in registration order
    pub fn candidates(&self, analysis: &FormulaAnalysis) -> Vec<Arc<dyn ProverCapability>> {
        self.ranked(analysis).into_iter().filter(|p| p.is_available()).collect()
    }

    /// Every registered prover in candidate order, available or not.
    /// Unavailable ones stay in the list so dispatch records them as
    /// failed attempts instead of dropping them silently.
    fn ranked(&self, analysis: &FormulaAnalysis) -> Vec<Arc<dyn ProverCapability>> {
        let mut ranked: Vec<Arc<dyn ProverCapability>> = Vec::new();
        let mut push = |prover: Arc<dyn ProverCapability>| {
            if !ranked.iter().any(|p| p.name() == prover.name()) {
                ranked.push(prover);
            }
        };

        for name in &analysis.recommended_provers {
            if let Some(prover) = self.registry.get(name) {
                push(prover);
            }
        }
        for prover in self.registry.iter() {
            push(Arc::clone(prover));
        }
        ranked
    }

    /// Candidate order for a strategy
    fn ordered(&self, strategy: SelectionStrategy, analysis: &FormulaAnalysis) -> Vec<Arc<dyn ProverCapability>> {
        let mut candidates = self.ranked(analysis);
        match strategy {
            SelectionStrategy::Fastest => {
                candidates.sort_by_key(|p| (p.capabilities().typical_latency_ms, self.registry.position(p.name())));
            }
            SelectionStrategy::MostCapable => {
                candidates.sort_by_key(|p| {
                    (std::cmp::Reverse(p.capabilities().feature_count()), self.registry.position(p.name()))
                });
            }
            SelectionStrategy::Auto | SelectionStrategy::Sequential | SelectionStrategy::Parallel => {}
        }
        candidates
    }

    /// Prove `goal` from `axioms`. `timeout` bounds the whole call.
    pub async fn prove(
        &self,
        goal: &Formula,
        axioms: &[Formula],
        strategy: SelectionStrategy,
        timeout: Duration,
    ) -> Result<ProofResult, RouterError> {
        let analysis = self.analyzer.analyze_problem(goal, axioms);
        debug!(
            "Analysis: {:?}, complexity {} -> {:?}",
            analysis.formula_type, analysis.complexity_score, analysis.recommended_provers
        );

        let candidates = self.ordered(strategy, &analysis);
        let top = match candidates.first() {
            Some(top) => top,
            None => return Err(RouterError::NoCandidates),
        };
        info!("Proving {} with {} over {} candidates", goal, strategy, candidates.len());

        match strategy {
            SelectionStrategy::Auto => {
                // With nothing available the top-ranked prover is the one reported
                let prover = candidates.iter().find(|p| p.is_available()).unwrap_or(top);
                self.prove_auto(prover, goal, axioms, timeout).await
            }
            SelectionStrategy::Sequential | SelectionStrategy::Fastest | SelectionStrategy::MostCapable => {
                Ok(self.prove_sequential(&candidates, goal, axioms, timeout).await)
            }
            SelectionStrategy::Parallel => Ok(self.prove_parallel(&candidates, goal, axioms, timeout).await),
        }
    }

    /// Prove with the configured default strategy and timeout
    pub async fn prove_default(&self, goal: &Formula, axioms: &[Formula]) -> Result<ProofResult, RouterError> {
        self.prove(goal, axioms, self.config.default_strategy, self.config.default_timeout()).await
    }

    /// Parse then prove
    pub async fn prove_text<S: AsRef<str>>(
        &self,
        goal: &str,
        axioms: &[S],
        strategy: SelectionStrategy,
        timeout: Duration,
    ) -> Result<ProofResult, RouterError> {
        let goal = self.parser.parse(goal)?;
        let axioms = self.parser.parse_all(axioms)?;
        self.prove(&goal, &axioms, strategy, timeout).await
    }

    /// Run every candidate to completion and compare their verdicts
    pub async fn cross_check(
        &self,
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
    ) -> Result<Reconciliation, RouterError> {
        let analysis = self.analyzer.analyze_problem(goal, axioms);
        let candidates = self.ranked(&analysis);
        if candidates.is_empty() {
            return Err(RouterError::NoCandidates);
        }

        let cancel = CancellationFlag::new();
        let outcome = self.launch_race(&candidates, goal, axioms, timeout, RaceMode::All, &cancel).await;
        Ok(reconcile(outcome.results))
    }

    async fn prove_auto(
        &self,
        prover: &Arc<dyn ProverCapability>,
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
    ) -> Result<ProofResult, RouterError> {
        let attempt = self
            .dispatcher
            .call(Arc::clone(prover), goal, axioms, timeout, CancellationFlag::new())
            .await;
        match attempt {
            Attempt::Answered(result) => Ok(result),
            Attempt::Failed { prover, reason } => Err(RouterError::ProverUnavailable { prover, reason }),
        }
    }

    async fn prove_sequential(
        &self,
        candidates: &[Arc<dyn ProverCapability>],
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
    ) -> ProofResult {
        let deadline = Instant::now() + timeout;
        let mut last = None;

        for prover in candidates {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("Deadline passed before {}", prover.name());
                last = Some(
                    ProofResult::new(ProofStatus::Timeout, prover.name())
                        .with_message("deadline passed before the prover was tried"),
                );
                break;
            }

            let result = self
                .dispatcher
                .call(Arc::clone(prover), goal, axioms, remaining, CancellationFlag::new())
                .await
                .into_result();
            if result.status.is_decisive() {
                return result;
            }
            debug!("{} gave {}, falling through", result.prover_used, result.status);
            last = Some(result);
        }

        last.unwrap_or_else(|| {
            ProofResult::new(ProofStatus::Unknown, "none").with_message("no candidate was tried")
        })
    }

    async fn prove_parallel(
        &self,
        candidates: &[Arc<dyn ProverCapability>],
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
    ) -> ProofResult {
        let start = Instant::now();
        let cancel = CancellationFlag::new();
        let outcome = self
            .launch_race(candidates, goal, axioms, timeout, RaceMode::FirstDecisive, &cancel)
            .await;

        if let Some(winner) = outcome.winner {
            return winner;
        }

        let timed_out = outcome.deadline_hit || outcome.results.iter().any(|r| r.status == ProofStatus::Timeout);
        let status = if timed_out { ProofStatus::Timeout } else { ProofStatus::Unknown };
        debug!("No candidate decided; aggregate {}", status);

        let mut aggregate = ProofResult::new(status, PARALLEL_PROVER)
            .with_elapsed(start.elapsed())
            .with_message(format!("no decisive result from {} candidates", candidates.len()));
        aggregate.sub_results = outcome.results;
        aggregate
    }

    async fn launch_race(
        &self,
        candidates: &[Arc<dyn ProverCapability>],
        goal: &Formula,
        axioms: &[Formula],
        timeout: Duration,
        mode: RaceMode,
        cancel: &CancellationFlag,
    ) -> portfolio::RaceOutcome {
        let deadline = tokio::time::Instant::now() + timeout;
        let goal = Arc::new(goal.clone());
        let axioms: Arc<[Formula]> = axioms.into();

        race(candidates, deadline, mode, cancel, |prover| {
            let dispatcher = self.dispatcher.clone();
            let goal = Arc::clone(&goal);
            let axioms = Arc::clone(&axioms);
            let cancel = cancel.clone();
            async move { dispatcher.call(prover, &goal, &axioms, timeout, cancel).await.into_result() }
        })
        .await
    }
}

impl std::fmt::Debug for ProverRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProverRouter")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
