// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later
// Criterion-based benchmarks for parsing, proving, analysis and caching

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use noesis::config::CacheConfig;
use noesis::{parse, CacheKey, Formula, FormulaAnalyzer, InferenceEngine, ProofCache, ProofResult, ProofStatus};
use std::collections::BTreeMap;

fn formulas(texts: &[&str]) -> Vec<Formula> {
    texts.iter().map(|t| parse(t).unwrap()).collect()
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let inputs = [
        ("propositional", "(P -> Q) & (Q -> R) -> (P -> R)"),
        ("quantified", "∀x. ∀y. Likes(x, y) → ∃z. Likes(z, f(x))"),
        ("deontic_temporal", "O(□(Q U R)) ∧ F(◊X(Q)) ↔ ¬P(R)"),
    ];

    for (name, text) in inputs {
        group.bench_with_input(BenchmarkId::new("parse", name), text, |b, text| {
            b.iter(|| parse(black_box(text)).unwrap())
        });
    }

    group.finish();
}

fn bench_native_proving(c: &mut Criterion) {
    let mut group = c.benchmark_group("native_proving");
    let engine = InferenceEngine::default();

    let chain: Vec<String> = (0..20).map(|i| format!("A{} -> A{}", i, i + 1)).collect();
    let mut chain_axioms = vec![parse("A0").unwrap()];
    chain_axioms.extend(chain.iter().map(|t| parse(t).unwrap()));
    let chain_goal = parse("A20").unwrap();

    group.bench_function("implication_chain_20", |b| {
        b.iter(|| engine.prove(black_box(&chain_goal), black_box(&chain_axioms), engine.default_budget()))
    });

    let syllogism_goal = parse("Mortal(socrates)").unwrap();
    let syllogism_axioms = formulas(&["∀x. Human(x) → Mortal(x)", "Human(socrates)"]);
    group.bench_function("syllogism", |b| {
        b.iter(|| engine.prove(black_box(&syllogism_goal), black_box(&syllogism_axioms), engine.default_budget()))
    });

    let deontic_goal = parse("O(Q)").unwrap();
    let deontic_axioms = formulas(&["O(P)", "O(P -> Q)"]);
    group.bench_function("deontic_k", |b| {
        b.iter(|| engine.prove(black_box(&deontic_goal), black_box(&deontic_axioms), engine.default_budget()))
    });

    let tableau_goal = parse("□(P ∨ Q)").unwrap();
    let tableau_axioms = formulas(&["□P"]);
    group.bench_function("modal_tableau", |b| {
        b.iter(|| engine.prove(black_box(&tableau_goal), black_box(&tableau_axioms), engine.default_budget()))
    });

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let analyzer = FormulaAnalyzer::default();
    let formula = parse("∀x. O(□(Human(x) → ◊Mortal(x))) ∧ ∃y. F(Likes(x, y) U R)").unwrap();

    c.bench_function("analyze_mixed", |b| b.iter(|| analyzer.analyze(black_box(&formula))));
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("proof_cache");
    let cache = ProofCache::new(CacheConfig::default()).unwrap();
    let goal = parse("Mortal(socrates)").unwrap();
    let axioms = formulas(&["∀x. Human(x) → Mortal(x)", "Human(socrates)"]);
    let config = BTreeMap::new();

    group.bench_function("key_digest", |b| {
        b.iter(|| CacheKey::new(black_box(&goal), black_box(&axioms), "native", &config))
    });

    let key = CacheKey::new(&goal, &axioms, "native", &config);
    cache.put(key, ProofResult::new(ProofStatus::Proved, "native"), None);
    group.bench_function("hit", |b| b.iter(|| cache.get(black_box(&key))));

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_native_proving, bench_analysis, bench_cache);
criterion_main!(benches);
