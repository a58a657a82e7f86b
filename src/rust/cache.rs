// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Content-addressed proof cache
//!
//! Keys are BLAKE3 digests of the goal's structure, the ordered axiom
//! list, the prover identity and the prover configuration. Formulas are
//! hashed node by node with a tag per node kind, so two formulas share a
//! key only when they are structurally equal; printed text is not enough
//! (a variable and a constant named `x` print the same). Entries expire after
//! their TTL, and the least recently used entry is evicted once the cache
//! is full. One mutex guards all state; only map and bookkeeping work
//! happens while it is held.
//!
//! Keys are syntactic: `A ∧ B` and `B ∧ A` are different entries.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CacheConfig;
use crate::core::{Formula, Term};
use crate::error::ConfigError;
use crate::proof::ProofResult;

/// 32-byte BLAKE3 digest identifying one proof problem for one prover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

// Section tags keep the framing unambiguous.
const TAG_GOAL: u8 = 0x01;
const TAG_AXIOM: u8 = 0x02;
const TAG_PROVER: u8 = 0x03;
const TAG_CONFIG_KEY: u8 = 0x04;
const TAG_CONFIG_VALUE: u8 = 0x05;

// Node tags
const NODE_PREDICATE: u8 = 0x10;
const NODE_NOT: u8 = 0x11;
const NODE_BINARY: u8 = 0x12;
const NODE_QUANTIFIED: u8 = 0x13;
const NODE_DEONTIC: u8 = 0x14;
const NODE_TEMPORAL: u8 = 0x15;
const NODE_BINARY_TEMPORAL: u8 = 0x16;
const TERM_VARIABLE: u8 = 0x20;
const TERM_CONSTANT: u8 = 0x21;
const TERM_FUNCTION: u8 = 0x22;

fn frame(hasher: &mut blake3::Hasher, tag: u8, bytes: &[u8]) {
    hasher.update(&[tag]);
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn feed_terms(hasher: &mut blake3::Hasher, terms: &[Term]) {
    let mut stack: Vec<&Term> = terms.iter().rev().collect();
    while let Some(term) = stack.pop() {
        match term {
            Term::Variable(name) => frame(hasher, TERM_VARIABLE, name.as_bytes()),
            Term::Constant(name) => frame(hasher, TERM_CONSTANT, name.as_bytes()),
            Term::Function { name, args } => {
                frame(hasher, TERM_FUNCTION, name.as_bytes());
                hasher.update(&(args.len() as u64).to_le_bytes());
                stack.extend(args.iter().rev());
            }
        }
    }
}

/// Pre-order walk; every tag has a fixed arity so the stream parses back
/// into exactly one tree.
fn feed_formula(hasher: &mut blake3::Hasher, formula: &Formula) {
    let mut stack = vec![formula];
    while let Some(node) = stack.pop() {
        match node {
            Formula::Predicate { name, args } => {
                frame(hasher, NODE_PREDICATE, name.as_bytes());
                hasher.update(&(args.len() as u64).to_le_bytes());
                feed_terms(hasher, args);
            }
            Formula::Not(_) => {
                hasher.update(&[NODE_NOT]);
            }
            Formula::Binary { op, .. } => {
                hasher.update(&[NODE_BINARY, *op as u8]);
            }
            Formula::Quantified { quantifier, variable, .. } => {
                hasher.update(&[NODE_QUANTIFIED, *quantifier as u8]);
                frame(hasher, NODE_QUANTIFIED, variable.as_bytes());
            }
            Formula::Deontic { op, .. } => {
                hasher.update(&[NODE_DEONTIC, *op as u8]);
            }
            Formula::Temporal { op, .. } => {
                hasher.update(&[NODE_TEMPORAL, *op as u8]);
            }
            Formula::BinaryTemporal { op, .. } => {
                hasher.update(&[NODE_BINARY_TEMPORAL, *op as u8]);
            }
        }
        stack.extend(node.children().into_iter().rev());
    }
}

impl CacheKey {
    pub fn new(
        goal: &Formula,
        axioms: &[Formula],
        prover: &str,
        config: &BTreeMap<String, String>,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TAG_GOAL]);
        feed_formula(&mut hasher, goal);
        for axiom in axioms {
            hasher.update(&[TAG_AXIOM]);
            feed_formula(&mut hasher, axiom);
        }
        frame(&mut hasher, TAG_PROVER, prover.as_bytes());
        for (key, value) in config {
            frame(&mut hasher, TAG_CONFIG_KEY, key.as_bytes());
            frame(&mut hasher, TAG_CONFIG_VALUE, value.as_bytes());
        }
        CacheKey(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Read-only cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Hits over lookups (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    result: ProofResult,
    inserted_at: Instant,
    ttl: Duration,
    /// Position in the LRU order
    tick: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// tick → key, oldest first
    lru: BTreeMap<u64, CacheKey>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(&entry.tick);
        Some(entry)
    }
}

/// Thread-safe LRU + TTL cache of proof results
pub struct ProofCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl ProofCache {
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(ProofCache { config, state: Mutex::new(CacheState::default()) })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Cached result annotated with `from_cache`, or `None` on a miss
    pub fn get(&self, key: &CacheKey) -> Option<ProofResult> {
        if !self.config.enabled {
            return None;
        }

        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            state.remove(key);
            state.expirations += 1;
            state.misses += 1;
            debug!("Cache entry {} expired", key);
            return None;
        }

        let tick = state.next_tick();
        let mut result = {
            let CacheState { entries, lru, .. } = &mut *state;
            let entry = entries.get_mut(key)?;
            lru.remove(&entry.tick);
            lru.insert(tick, *key);
            entry.tick = tick;
            entry.result.clone()
        };
        state.hits += 1;
        drop(state);

        debug!("Cache hit for {}", key);
        result.from_cache = true;
        Some(result)
    }

    /// Store a result; `ttl` of `None` uses the configured default
    pub fn put(&self, key: CacheKey, result: ProofResult, ttl: Option<Duration>) {
        if !self.config.enabled {
            return;
        }

        let mut result = result;
        result.from_cache = false;
        let ttl = ttl.unwrap_or_else(|| self.config.ttl());

        let mut state = self.state.lock();
        state.remove(&key);
        let tick = state.next_tick();
        state.entries.insert(key, CacheEntry { result, inserted_at: Instant::now(), ttl, tick });
        state.lru.insert(tick, key);

        while state.entries.len() > self.config.max_entries {
            let oldest = match state.lru.iter().next() {
                Some((_, key)) => *key,
                None => break,
            };
            state.remove(&oldest);
            state.evictions += 1;
            debug!("Evicted least recently used entry {}", oldest);
        }
    }

    /// Drop one entry; returns whether it was present
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.state.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.lru.clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            state.remove(key);
        }
        state.expirations += expired.len() as u64;
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
            evictions: state.evictions,
            expirations: state.expirations,
        }
    }
}

impl Default for ProofCache {
    fn default() -> Self {
        ProofCache { config: CacheConfig::default(), state: Mutex::new(CacheState::default()) }
    }
}
