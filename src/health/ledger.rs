use crate::core::events::{ErrorCategory, ErrorEvent, ErrorSeverity, SystemHealth};
use chrono::{Duration as ChronoDuration, Utc};
use log::info;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Bounded FIFO capacity for recent error events
const EVENT_CAPACITY: usize = 100;
/// Window over which health is scored
const HEALTH_WINDOW_SECS: i64 = 300;
/// Minimum gap between recomputations while no new events arrive
const COMPUTE_INTERVAL: Duration = Duration::from_secs(60);

struct LedgerInner {
    counts: HashMap<ErrorCategory, u32>,
    events: VecDeque<ErrorEvent>,
    cached_health: SystemHealth,
    last_compute: Option<Instant>,
    dirty: bool,
}

/// Error bookkeeping store behind one coarse lock
///
/// Critical sections are in-memory only; logging and host I/O happen outside.
pub struct HealthLedger {
    inner: RwLock<LedgerInner>,
}

impl HealthLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                counts: HashMap::new(),
                events: VecDeque::with_capacity(EVENT_CAPACITY),
                cached_health: SystemHealth::Healthy,
                last_compute: None,
                dirty: false,
            }),
        }
    }

    /// Append a classified error event; oldest is evicted at capacity
    pub async fn record(&self, event: ErrorEvent) {
        let mut inner = self.inner.write().await;
        *inner.counts.entry(event.category).or_insert(0) += 1;
        inner.events.push_back(event);
        while inner.events.len() > EVENT_CAPACITY {
            inner.events.pop_front();
        }
        inner.dirty = true;
    }

    /// Score system health from the recent window
    ///
    /// Recomputes at most once per interval unless new events arrived since
    /// the last score. Transitions are logged; nothing else happens here.
    pub async fn compute_health(&self) -> SystemHealth {
        let mut inner = self.inner.write().await;

        if !inner.dirty {
            if let Some(last) = inner.last_compute {
                if last.elapsed() < COMPUTE_INTERVAL {
                    return inner.cached_health;
                }
            }
        }

        let cutoff = Utc::now() - ChronoDuration::seconds(HEALTH_WINDOW_SECS);
        let mut critical = 0u32;
        let mut high = 0u32;
        let mut medium = 0u32;
        let mut low = 0u32;
        for event in inner.events.iter() {
            if event.timestamp < cutoff || event.resolved {
                continue;
            }
            match event.severity {
                ErrorSeverity::Critical => critical += 1,
                ErrorSeverity::High => high += 1,
                ErrorSeverity::Medium => medium += 1,
                ErrorSeverity::Low => low += 1,
            }
        }

        let health = if critical >= 1 {
            SystemHealth::Failed
        } else if high >= 3 {
            SystemHealth::Critical
        } else if medium >= 5 {
            SystemHealth::Degraded
        } else if low >= 10 {
            SystemHealth::Warning
        } else {
            SystemHealth::Healthy
        };

        if health != inner.cached_health {
            info!(
                "error-ledger health {:?} -> {:?} ({} critical, {} high, {} medium, {} low in window)",
                inner.cached_health, health, critical, high, medium, low
            );
        }
        inner.cached_health = health;
        inner.last_compute = Some(Instant::now());
        inner.dirty = false;
        health
    }

    /// Most recent `n` events, newest first
    pub async fn recent_errors(&self, n: usize) -> Vec<ErrorEvent> {
        let inner = self.inner.read().await;
        inner.events.iter().rev().take(n).cloned().collect()
    }

    /// Total recorded errors per category
    pub async fn category_counts(&self) -> HashMap<ErrorCategory, u32> {
        self.inner.read().await.counts.clone()
    }

    /// Mark unresolved events of a category as resolved
    ///
    /// Called after a successful recovery so stale events stop weighing on
    /// the health score.
    pub async fn mark_resolved(&self, category: ErrorCategory) {
        let mut inner = self.inner.write().await;
        let mut changed = false;
        for event in inner.events.iter_mut() {
            if event.category == category && !event.resolved {
                event.resolved = true;
                changed = true;
            }
        }
        if changed {
            inner.dirty = true;
        }
    }
}

impl Default for HealthLedger {
    fn default() -> Self {
        Self::new()
    }
}
