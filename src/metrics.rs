//! Lightweight in-memory counters for the annotation, relationship and agent paths.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

use lakegate_core::AccessTier;

#[derive(Default)]
struct CoreMetrics {
    annotations_admin: AtomicU64,
    annotations_project: AtomicU64,
    annotations_dataset: AtomicU64,
    dataset_checks: AtomicU64,
    dataset_check_failures: AtomicU64,
    relationship_cache_hits: AtomicU64,
    relationship_cache_misses: AtomicU64,
    agent_cache_hits: AtomicU64,
    agent_cache_misses: AtomicU64,
    agent_provision_failures: AtomicU64,
}

static CORE_METRICS: OnceLock<CoreMetrics> = OnceLock::new();

fn metrics() -> &'static CoreMetrics {
    CORE_METRICS.get_or_init(CoreMetrics::default)
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Records which tier resolved an annotation call
pub fn record_annotation(tier: AccessTier) {
    let m = metrics();
    match tier {
        AccessTier::Admin => bump(&m.annotations_admin),
        AccessTier::Project => bump(&m.annotations_project),
        AccessTier::Dataset => bump(&m.annotations_dataset),
    }
}

pub fn record_dataset_check() {
    bump(&metrics().dataset_checks);
}

pub fn record_dataset_check_failure() {
    bump(&metrics().dataset_check_failures);
}

pub fn record_relationship_cache(hit: bool) {
    let m = metrics();
    if hit {
        bump(&m.relationship_cache_hits);
    } else {
        bump(&m.relationship_cache_misses);
    }
}

pub fn record_agent_cache(hit: bool) {
    let m = metrics();
    if hit {
        bump(&m.agent_cache_hits);
    } else {
        bump(&m.agent_cache_misses);
    }
}

pub fn record_agent_provision_failure() {
    bump(&metrics().agent_provision_failures);
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub annotations_admin: u64,
    pub annotations_project: u64,
    pub annotations_dataset: u64,
    pub dataset_checks: u64,
    pub dataset_check_failures: u64,
    pub relationship_cache_hits: u64,
    pub relationship_cache_misses: u64,
    pub agent_cache_hits: u64,
    pub agent_cache_misses: u64,
    pub agent_provision_failures: u64,
    /// Share of relationship reads served from cache
    pub relationship_hit_ratio: Option<f64>,
}

pub fn snapshot() -> MetricsSnapshot {
    let m = metrics();
    let load = |c: &AtomicU64| c.load(Ordering::Relaxed);

    let hits = load(&m.relationship_cache_hits);
    let misses = load(&m.relationship_cache_misses);
    let relationship_hit_ratio = if hits + misses > 0 {
        Some(hits as f64 / (hits + misses) as f64)
    } else {
        None
    };

    MetricsSnapshot {
        annotations_admin: load(&m.annotations_admin),
        annotations_project: load(&m.annotations_project),
        annotations_dataset: load(&m.annotations_dataset),
        dataset_checks: load(&m.dataset_checks),
        dataset_check_failures: load(&m.dataset_check_failures),
        relationship_cache_hits: hits,
        relationship_cache_misses: misses,
        agent_cache_hits: load(&m.agent_cache_hits),
        agent_cache_misses: load(&m.agent_cache_misses),
        agent_provision_failures: load(&m.agent_provision_failures),
        relationship_hit_ratio,
    }
}
