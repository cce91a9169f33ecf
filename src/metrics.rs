//! Lightweight global metrics for IniVault.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Shadow working copy
//! - Handle registry
//! - Publish (save) / remove

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Shadow -----
static SHADOWS_MATERIALIZED: AtomicU64 = AtomicU64::new(0);
static SHADOW_BYTES_COPIED: AtomicU64 = AtomicU64::new(0);

// ----- Handles -----
static HANDLES_ACQUIRED: AtomicU64 = AtomicU64::new(0);
static HANDLES_RELEASED: AtomicU64 = AtomicU64::new(0);
static HANDLES_LEAKED: AtomicU64 = AtomicU64::new(0);
static HANDLE_FLUSH_FAILURES: AtomicU64 = AtomicU64::new(0);

// ----- Publish / remove -----
static PUBLISHES_TOTAL: AtomicU64 = AtomicU64::new(0);
static PUBLISHES_DRAFT: AtomicU64 = AtomicU64::new(0);
static PUBLISH_BYTES: AtomicU64 = AtomicU64::new(0);
static REMOVES_TOTAL: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Shadow
    pub shadows_materialized: u64,
    pub shadow_bytes_copied: u64,

    // Handles
    pub handles_acquired: u64,
    pub handles_released: u64,
    pub handles_leaked: u64,
    pub handle_flush_failures: u64,

    // Publish / remove
    pub publishes_total: u64,
    pub publishes_draft: u64,
    pub publish_bytes: u64,
    pub removes_total: u64,
}

impl MetricsSnapshot {
    /// Handles acquired but neither released nor force-disposed yet.
    pub fn handles_outstanding(&self) -> u64 {
        self.handles_acquired
            .saturating_sub(self.handles_released)
            .saturating_sub(self.handles_leaked)
    }
}

// ----- Recorders (Shadow) -----
pub fn record_shadow_materialized(bytes: u64) {
    SHADOWS_MATERIALIZED.fetch_add(1, Ordering::Relaxed);
    SHADOW_BYTES_COPIED.fetch_add(bytes, Ordering::Relaxed);
}

// ----- Recorders (Handles) -----
pub fn record_handle_acquired() {
    HANDLES_ACQUIRED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_handle_released() {
    HANDLES_RELEASED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_handle_leaked() {
    HANDLES_LEAKED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_flush_failure() {
    HANDLE_FLUSH_FAILURES.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Publish / remove) -----
pub fn record_publish(to_original: bool, bytes: u64) {
    PUBLISHES_TOTAL.fetch_add(1, Ordering::Relaxed);
    if !to_original {
        PUBLISHES_DRAFT.fetch_add(1, Ordering::Relaxed);
    }
    PUBLISH_BYTES.fetch_add(bytes, Ordering::Relaxed);
}

pub fn record_remove() {
    REMOVES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        shadows_materialized: SHADOWS_MATERIALIZED.load(Ordering::Relaxed),
        shadow_bytes_copied: SHADOW_BYTES_COPIED.load(Ordering::Relaxed),

        handles_acquired: HANDLES_ACQUIRED.load(Ordering::Relaxed),
        handles_released: HANDLES_RELEASED.load(Ordering::Relaxed),
        handles_leaked: HANDLES_LEAKED.load(Ordering::Relaxed),
        handle_flush_failures: HANDLE_FLUSH_FAILURES.load(Ordering::Relaxed),

        publishes_total: PUBLISHES_TOTAL.load(Ordering::Relaxed),
        publishes_draft: PUBLISHES_DRAFT.load(Ordering::Relaxed),
        publish_bytes: PUBLISH_BYTES.load(Ordering::Relaxed),
        removes_total: REMOVES_TOTAL.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    SHADOWS_MATERIALIZED.store(0, Ordering::Relaxed);
    SHADOW_BYTES_COPIED.store(0, Ordering::Relaxed);

    HANDLES_ACQUIRED.store(0, Ordering::Relaxed);
    HANDLES_RELEASED.store(0, Ordering::Relaxed);
    HANDLES_LEAKED.store(0, Ordering::Relaxed);
    HANDLE_FLUSH_FAILURES.store(0, Ordering::Relaxed);

    PUBLISHES_TOTAL.store(0, Ordering::Relaxed);
    PUBLISHES_DRAFT.store(0, Ordering::Relaxed);
    PUBLISH_BYTES.store(0, Ordering::Relaxed);
    REMOVES_TOTAL.store(0, Ordering::Relaxed);
}
