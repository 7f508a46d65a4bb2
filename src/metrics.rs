// Bridge metrics module
//
// Lightweight counters describing bridge lifecycles and snapshot traffic

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by every bridge created from one [`QueryContext`](crate::QueryContext)
///
/// Uses atomic operations so bridges can record without locks.
#[derive(Debug)]
pub struct BridgeMetrics {
    /// Bridges that completed construction
    pub bridges_mounted: AtomicU64,

    /// Bridges whose subscription was released
    pub bridges_torn_down: AtomicU64,

    /// Observer snapshots written into reactive state
    pub snapshots_applied: AtomicU64,

    /// Observer snapshots dropped because the bridge was already torn down
    pub snapshots_ignored: AtomicU64,

    /// Option changes forwarded to an observer
    pub option_changes: AtomicU64,

    /// Full rebuilds of a state container
    pub state_rebuilds: AtomicU64,

    start_time: Instant,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self {
            bridges_mounted: AtomicU64::new(0),
            bridges_torn_down: AtomicU64::new(0),
            snapshots_applied: AtomicU64::new(0),
            snapshots_ignored: AtomicU64::new(0),
            option_changes: AtomicU64::new(0),
            state_rebuilds: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_mounted(&self) {
        self.bridges_mounted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_torn_down(&self) {
        self.bridges_torn_down.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_ignored(&self) {
        self.snapshots_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_option_change(&self) {
        self.option_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rebuild(&self) {
        self.state_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    /// Bridges mounted and not yet torn down
    pub fn active_bridges(&self) -> u64 {
        self.bridges_mounted
            .load(Ordering::Relaxed)
            .saturating_sub(self.bridges_torn_down.load(Ordering::Relaxed))
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Bridge Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Bridges: {} mounted, {} torn down, {} active",
            self.bridges_mounted.load(Ordering::Relaxed),
            self.bridges_torn_down.load(Ordering::Relaxed),
            self.active_bridges()
        );
        tracing::info!(
            "Snapshots: {} applied, {} ignored after teardown",
            self.snapshots_applied.load(Ordering::Relaxed),
            self.snapshots_ignored.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Option changes: {}, state rebuilds: {}",
            self.option_changes.load(Ordering::Relaxed),
            self.state_rebuilds.load(Ordering::Relaxed)
        );
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
