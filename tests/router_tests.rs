// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Router strategy tests against mock provers

mod common;

use common::assertions::assert_outcome;
use common::mock_prover::MockProver;
use common::router_with;
use noesis::router::{Agreement, PARALLEL_PROVER};
use noesis::{parse, Formula, ProofStatus, ProverCapabilities, RouterError, SelectionStrategy};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(5);

fn problem() -> (Formula, Vec<Formula>) {
    (parse("Q").unwrap(), vec![parse("P").unwrap(), parse("P -> Q").unwrap()])
}

#[tokio::test]
async fn test_sequential_falls_back_past_unavailable() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved).unavailable());
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Proved));
    let router = router_with(vec![alpha.clone(), beta.clone()]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Sequential, TIMEOUT).await.unwrap();

    assert_outcome(&result, ProofStatus::Proved, "beta");
    assert_eq!(alpha.calls(), 0);
}

#[tokio::test]
async fn test_sequential_falls_back_past_failure() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved).failing());
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Disproved));
    let router = router_with(vec![alpha.clone(), beta]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Sequential, TIMEOUT).await.unwrap();

    assert_outcome(&result, ProofStatus::Disproved, "beta");
    assert_eq!(alpha.calls(), 1);

    let stats = router.stats().await;
    assert_eq!(stats["alpha"].failures, 1);
    assert_eq!(stats["beta"].successes, 1);
}

#[tokio::test]
async fn test_sequential_returns_last_when_undecided() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Unknown));
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Timeout));
    let router = router_with(vec![alpha, beta]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Sequential, TIMEOUT).await.unwrap();
    assert_outcome(&result, ProofStatus::Timeout, "beta");
}

#[tokio::test]
async fn test_auto_skips_unavailable_top_rank() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved).unavailable());
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Unknown));
    let router = router_with(vec![alpha, beta]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Auto, TIMEOUT).await.unwrap();
    assert_outcome(&result, ProofStatus::Unknown, "beta");
}

#[tokio::test]
async fn test_auto_surfaces_failure() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved).failing());
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Proved));
    let router = router_with(vec![alpha, beta.clone()]);

    let (goal, axioms) = problem();
    let err = router.prove(&goal, &axioms, SelectionStrategy::Auto, TIMEOUT).await.unwrap_err();
    match err {
        RouterError::ProverUnavailable { prover, reason } => {
            assert_eq!(prover, "alpha");
            assert!(reason.contains("crashed"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(beta.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_provers_are_recorded_not_fatal() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved).unavailable());
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Proved).unavailable());
    let router = router_with(vec![alpha.clone(), beta.clone()]);
    let (goal, axioms) = problem();

    for strategy in [SelectionStrategy::Sequential, SelectionStrategy::Fastest, SelectionStrategy::MostCapable] {
        let result = router.prove(&goal, &axioms, strategy, TIMEOUT).await.unwrap();
        assert_eq!(result.status, ProofStatus::Error, "{}", strategy);
    }

    let result = router.prove(&goal, &axioms, SelectionStrategy::Parallel, TIMEOUT).await.unwrap();
    assert_outcome(&result, ProofStatus::Unknown, PARALLEL_PROVER);
    assert_eq!(result.sub_results.len(), 2);
    assert!(result.sub_results.iter().all(|r| r.status == ProofStatus::Error));

    assert_eq!(alpha.calls() + beta.calls(), 0);
    assert!(router.stats().await.is_empty());
}

#[tokio::test]
async fn test_auto_reports_top_rank_when_none_available() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved).unavailable());
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Proved).unavailable());
    let router = router_with(vec![alpha, beta]);

    let (goal, axioms) = problem();
    let err = router.prove(&goal, &axioms, SelectionStrategy::Auto, TIMEOUT).await.unwrap_err();
    match err {
        RouterError::ProverUnavailable { prover, .. } => assert_eq!(prover, "alpha"),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_parallel_first_decisive_wins() {
    let slow = Arc::new(MockProver::new("slow", ProofStatus::Proved).with_delay(Duration::from_secs(3)));
    let fast = Arc::new(MockProver::new("fast", ProofStatus::Disproved).with_delay(Duration::from_millis(20)));
    let router = router_with(vec![slow, fast]);

    let (goal, axioms) = problem();
    let start = Instant::now();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Parallel, TIMEOUT).await.unwrap();

    assert_outcome(&result, ProofStatus::Disproved, "fast");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_parallel_skips_undecided_results() {
    let unsure = Arc::new(MockProver::new("unsure", ProofStatus::Unknown));
    let sure = Arc::new(MockProver::new("sure", ProofStatus::Proved).with_delay(Duration::from_millis(50)));
    let router = router_with(vec![unsure, sure]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Parallel, TIMEOUT).await.unwrap();
    assert_outcome(&result, ProofStatus::Proved, "sure");
}

#[tokio::test]
async fn test_parallel_aggregate_when_undecided() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Unknown));
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Unknown).failing());
    let router = router_with(vec![alpha, beta]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::Parallel, TIMEOUT).await.unwrap();

    assert_outcome(&result, ProofStatus::Unknown, PARALLEL_PROVER);
    let mut statuses: Vec<(String, ProofStatus)> =
        result.sub_results.iter().map(|r| (r.prover_used.clone(), r.status)).collect();
    statuses.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        statuses,
        vec![("alpha".to_string(), ProofStatus::Unknown), ("beta".to_string(), ProofStatus::Error)]
    );
}

#[tokio::test]
async fn test_parallel_deadline() {
    let stuck = Arc::new(MockProver::new("stuck", ProofStatus::Proved).with_delay(Duration::from_secs(30)));
    let router = router_with(vec![stuck]);

    let (goal, axioms) = problem();
    let start = Instant::now();
    let result = router
        .prove(&goal, &axioms, SelectionStrategy::Parallel, Duration::from_millis(100))
        .await
        .unwrap();

    assert_outcome(&result, ProofStatus::Timeout, PARALLEL_PROVER);
    assert_eq!(result.sub_results.len(), 1);
    assert_eq!(result.sub_results[0].status, ProofStatus::Timeout);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_fastest_orders_by_latency() {
    let slow = Arc::new(MockProver::new("slow", ProofStatus::Proved).with_latency(500));
    let quick = Arc::new(MockProver::new("quick", ProofStatus::Proved).with_latency(5));
    let router = router_with(vec![slow.clone(), quick]);

    let (goal, axioms) = problem();
    let sequential = router.prove(&goal, &axioms, SelectionStrategy::Sequential, TIMEOUT).await.unwrap();
    assert_eq!(sequential.prover_used, "slow");

    let fastest = router.prove(&goal, &axioms, SelectionStrategy::Fastest, TIMEOUT).await.unwrap();
    assert_eq!(fastest.prover_used, "quick");
}

#[tokio::test]
async fn test_most_capable_orders_by_features() {
    let narrow = Arc::new(MockProver::new("narrow", ProofStatus::Proved).with_capabilities(ProverCapabilities {
        supports_quantifiers: true,
        ..ProverCapabilities::default()
    }));
    let broad = Arc::new(MockProver::new("broad", ProofStatus::Proved).with_capabilities(ProverCapabilities {
        supports_quantifiers: true,
        supports_modal: true,
        supports_deontic: true,
        ..ProverCapabilities::default()
    }));
    let router = router_with(vec![narrow, broad]);

    let (goal, axioms) = problem();
    let result = router.prove(&goal, &axioms, SelectionStrategy::MostCapable, TIMEOUT).await.unwrap();
    assert_eq!(result.prover_used, "broad");
}

#[tokio::test]
async fn test_cache_bypasses_prover() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved));
    let router = router_with(vec![alpha.clone()]);

    let (goal, axioms) = problem();
    let first = router.prove(&goal, &axioms, SelectionStrategy::Auto, TIMEOUT).await.unwrap();
    let second = router.prove(&goal, &axioms, SelectionStrategy::Auto, TIMEOUT).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(alpha.calls(), 1);
    assert_eq!(router.cache().stats().hits, 1);
}

#[tokio::test]
async fn test_resource_limits_are_not_cached() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Timeout));
    let router = router_with(vec![alpha.clone()]);

    let (goal, axioms) = problem();
    for _ in 0..2 {
        let result = router.prove(&goal, &axioms, SelectionStrategy::Auto, TIMEOUT).await.unwrap();
        assert!(!result.from_cache);
    }
    assert_eq!(alpha.calls(), 2);
}

#[tokio::test]
async fn test_cross_check_flags_disagreement() {
    let alpha = Arc::new(MockProver::new("alpha", ProofStatus::Proved));
    let beta = Arc::new(MockProver::new("beta", ProofStatus::Disproved).with_delay(Duration::from_millis(20)));
    let router = router_with(vec![alpha, beta]);

    let (goal, axioms) = problem();
    let reconciliation = router.cross_check(&goal, &axioms, TIMEOUT).await.unwrap();

    assert_eq!(reconciliation.agreement, Agreement::Conflicting);
    assert!(reconciliation.needs_review());
    assert_eq!(reconciliation.agreeing, vec!["alpha"]);
    assert_eq!(reconciliation.disagreeing, vec!["beta"]);
}
