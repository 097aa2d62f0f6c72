use crate::core::events::{SystemHealth, SystemMode};
use crate::health::ledger::HealthLedger;
use log::{error, info, warn};
use tokio::sync::RwLock;

/// Shared health state, constructed once at startup and passed by handle
/// into every component that reads or updates it
pub struct HealthState {
    ledger: HealthLedger,
    mode: RwLock<SystemMode>,
    worst_component: RwLock<SystemHealth>,
    consecutive_failures: RwLock<u32>,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            ledger: HealthLedger::new(),
            mode: RwLock::new(SystemMode::Normal),
            worst_component: RwLock::new(SystemHealth::Healthy),
            consecutive_failures: RwLock::new(0),
        }
    }

    pub fn ledger(&self) -> &HealthLedger {
        &self.ledger
    }

    pub async fn mode(&self) -> SystemMode {
        *self.mode.read().await
    }

    pub async fn is_in_recovery_mode(&self) -> bool {
        matches!(
            *self.mode.read().await,
            SystemMode::Recovery | SystemMode::Emergency
        )
    }

    /// Aggregate health: the worst of the error-window score and the worst
    /// monitored component status
    pub async fn system_health(&self) -> SystemHealth {
        let ledger_health = self.ledger.compute_health().await;
        let component_health = *self.worst_component.read().await;
        ledger_health.max(component_health)
    }

    pub(crate) async fn set_worst_component(&self, status: SystemHealth) {
        *self.worst_component.write().await = status;
    }

    /// Switch the global mode; Emergency can only be left via
    /// `reset_emergency`
    pub(crate) async fn set_mode(&self, new_mode: SystemMode) {
        let mut mode = self.mode.write().await;
        if *mode == new_mode || *mode == SystemMode::Emergency {
            return;
        }
        match new_mode {
            SystemMode::Normal => info!("system mode {:?} -> Normal", *mode),
            SystemMode::Recovery => warn!("system mode {:?} -> Recovery", *mode),
            SystemMode::Emergency => error!("system mode {:?} -> Emergency", *mode),
        }
        *mode = new_mode;
    }

    pub(crate) async fn enter_emergency(&self) {
        let mut mode = self.mode.write().await;
        if *mode != SystemMode::Emergency {
            error!("system mode {:?} -> Emergency; automatic recovery halted", *mode);
            *mode = SystemMode::Emergency;
        }
    }

    /// External intervention hook: leave Emergency Mode
    ///
    /// Drops back to Recovery when components are still unhealthy, otherwise
    /// to Normal, and clears the consecutive-failure counter.
    pub async fn reset_emergency(&self) {
        let mut mode = self.mode.write().await;
        if *mode != SystemMode::Emergency {
            return;
        }
        let worst = *self.worst_component.read().await;
        let next = if worst > SystemHealth::Healthy {
            SystemMode::Recovery
        } else {
            SystemMode::Normal
        };
        warn!("emergency mode reset externally, resuming as {:?}", next);
        *mode = next;
        *self.consecutive_failures.write().await = 0;
    }

    /// Count one failed recovery attempt; returns the new streak length
    pub(crate) async fn record_recovery_failure(&self) -> u32 {
        let mut failures = self.consecutive_failures.write().await;
        *failures += 1;
        *failures
    }

    pub(crate) async fn reset_recovery_failures(&self) {
        *self.consecutive_failures.write().await = 0;
    }

    pub async fn consecutive_failures(&self) -> u32 {
        *self.consecutive_failures.read().await
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
