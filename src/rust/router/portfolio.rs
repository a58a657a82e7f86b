// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Concurrent candidate dispatch
//!
//! `race` runs every candidate on its own task under one shared deadline.
//! In `RaceMode::FirstDecisive` the first `Proved`/`Disproved` result wins
//! and the rest are cancelled; in `RaceMode::All` every candidate runs to
//! completion (or the deadline) and `reconcile` compares their verdicts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::inference::CancellationFlag;
use crate::proof::{ProofResult, ProofStatus};
use crate::provers::ProverCapability;

/// When a race stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RaceMode {
    FirstDecisive,
    All,
}

/// What a race produced
#[derive(Debug, Clone)]
pub(crate) struct RaceOutcome {
    /// First decisive result, in `FirstDecisive` mode
    pub winner: Option<ProofResult>,

    /// Every other result, in completion order, then candidates that never
    /// reported
    pub results: Vec<ProofResult>,

    pub deadline_hit: bool,
}

/// Run `launch` for every candidate concurrently until the mode is satisfied
/// or `deadline` passes. `cancel` is raised whenever the race stops early.
pub(crate) async fn race<F, Fut>(
    candidates: &[Arc<dyn ProverCapability>],
    deadline: Instant,
    mode: RaceMode,
    cancel: &CancellationFlag,
    launch: F,
) -> RaceOutcome
where
    F: Fn(Arc<dyn ProverCapability>) -> Fut,
    Fut: Future<Output = ProofResult> + Send + 'static,
{
    let mut set = JoinSet::new();
    for (index, prover) in candidates.iter().enumerate() {
        let call = launch(Arc::clone(prover));
        set.spawn(async move { (index, call.await) });
    }
    debug!("Racing {} candidates", candidates.len());

    let mut pending: BTreeSet<usize> = (0..candidates.len()).collect();
    let mut results = Vec::new();
    let mut winner = None;
    let mut deadline_hit = false;

    loop {
        match tokio::time::timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok((index, result)))) => {
                pending.remove(&index);
                if mode == RaceMode::FirstDecisive && result.status.is_decisive() {
                    info!("{} won the race with {}", result.prover_used, result.status);
                    winner = Some(result);
                    break;
                }
                results.push(result);
            }
            Ok(Some(Err(err))) => warn!("Candidate task failed: {}", err),
            Ok(None) => break,
            Err(_) => {
                debug!("Race deadline passed with {} candidates in flight", pending.len());
                deadline_hit = true;
                break;
            }
        }
    }

    if !set.is_empty() {
        cancel.cancel();
        set.abort_all();
    }

    // Losers cancelled after a win are not reported
    if winner.is_none() {
        for index in pending {
            let name = candidates[index].name();
            let missing = if deadline_hit {
                ProofResult::new(ProofStatus::Timeout, name).with_message("deadline passed before the prover answered")
            } else {
                ProofResult::error(name, "prover task failed")
            };
            results.push(missing);
        }
    }

    RaceOutcome { winner, results, deadline_hit }
}

/// How far decisive verdicts agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agreement {
    /// Two or more provers reached the same verdict
    CrossChecked,
    /// Exactly one prover reached a verdict
    SingleProver,
    /// Provers reached opposite verdicts
    Conflicting,
    /// No prover reached a verdict
    Undecided,
}

/// Comparison of several provers' results on one problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Agreed verdict; `None` when undecided or conflicting
    pub status: Option<ProofStatus>,
    pub agreement: Agreement,
    pub agreeing: Vec<String>,
    pub disagreeing: Vec<String>,
    pub results: Vec<ProofResult>,
}

impl Reconciliation {
    pub fn needs_review(&self) -> bool {
        self.agreement == Agreement::Conflicting
    }
}

/// Compare decisive verdicts; the first decisive result sets the reference
pub fn reconcile(results: Vec<ProofResult>) -> Reconciliation {
    let decisive: Vec<&ProofResult> = results.iter().filter(|r| r.status.is_decisive()).collect();

    let reference = match decisive.first() {
        Some(first) => first.status,
        None => {
            return Reconciliation {
                status: None,
                agreement: Agreement::Undecided,
                agreeing: vec![],
                disagreeing: vec![],
                results,
            }
        }
    };

    let (agreeing, disagreeing): (Vec<&ProofResult>, Vec<&ProofResult>) =
        decisive.into_iter().partition(|r| r.status == reference);
    let agreeing: Vec<String> = agreeing.iter().map(|r| r.prover_used.clone()).collect();
    let disagreeing: Vec<String> = disagreeing.iter().map(|r| r.prover_used.clone()).collect();

    let (status, agreement) = if !disagreeing.is_empty() {
        warn!("Provers disagree: {:?} vs {:?}", agreeing, disagreeing);
        (None, Agreement::Conflicting)
    } else if agreeing.len() >= 2 {
        (Some(reference), Agreement::CrossChecked)
    } else {
        (Some(reference), Agreement::SingleProver)
    };

    Reconciliation { status, agreement, agreeing, disagreeing, results }
}
