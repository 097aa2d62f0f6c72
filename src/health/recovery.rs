use crate::core::events::{
    ErrorCategory, ErrorSeverity, RecoveryAction, RecoveryEvent, SystemHealth,
};
use crate::core::CoreError;
use crate::health::classifier::ErrorHandler;
use crate::health::monitor::HealthMonitor;
use crate::health::probes;
use crate::health::state::HealthState;
use async_trait::async_trait;
use log::{info, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Consecutive failed attempts that flip the system into Emergency Mode
pub const EMERGENCY_THRESHOLD: u32 = 3;
/// Bounded FIFO capacity for recovery history
const HISTORY_CAPACITY: usize = 50;

/// Executes a recovery action for one component
#[async_trait]
pub trait RecoveryHandler: Send + Sync {
    async fn execute(&self, action: RecoveryAction) -> Result<(), CoreError>;
}

/// Default handler: every action succeeds without side effects
///
/// Real deployments register host-backed handlers per component.
pub struct NoopRecoveryHandler;

#[async_trait]
impl RecoveryHandler for NoopRecoveryHandler {
    async fn execute(&self, _action: RecoveryAction) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Map a degraded component status to the action taken for it
pub fn action_for_status(status: SystemHealth) -> RecoveryAction {
    match status {
        SystemHealth::Failed => RecoveryAction::Restart,
        SystemHealth::Critical => RecoveryAction::Fallback,
        SystemHealth::Degraded => RecoveryAction::Retry,
        SystemHealth::Warning | SystemHealth::Healthy => RecoveryAction::None,
    }
}

fn category_for_component(name: &str) -> ErrorCategory {
    match name {
        probes::TRADING_ENGINE => ErrorCategory::Trading,
        probes::RISK_ENGINE => ErrorCategory::Risk,
        probes::DATA_FEED => ErrorCategory::Data,
        probes::NETWORK => ErrorCategory::Network,
        _ => ErrorCategory::System,
    }
}

/// Selects and executes recovery actions for degraded components and drives
/// the global Normal/Recovery/Emergency escalation
pub struct RecoveryOrchestrator {
    state: Arc<HealthState>,
    monitor: Arc<HealthMonitor>,
    handler: Arc<ErrorHandler>,
    handlers: RwLock<HashMap<String, Arc<dyn RecoveryHandler>>>,
    history: RwLock<VecDeque<RecoveryEvent>>,
    last_attempt: RwLock<Option<Instant>>,
    cooldown: Duration,
}

impl RecoveryOrchestrator {
    pub fn new(
        state: Arc<HealthState>,
        monitor: Arc<HealthMonitor>,
        handler: Arc<ErrorHandler>,
        cooldown: Duration,
    ) -> Self {
        Self {
            state,
            monitor,
            handler,
            handlers: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            last_attempt: RwLock::new(None),
            cooldown,
        }
    }

    /// Register a component-specific recovery handler
    pub async fn register_handler(&self, component: &str, handler: Arc<dyn RecoveryHandler>) {
        self.handlers
            .write()
            .await
            .insert(component.to_string(), handler);
    }

    /// Attempt recovery for a degraded component
    ///
    /// No-op in Emergency Mode and inside the global cooldown window.
    pub async fn trigger_recovery(&self, component: &str, status: SystemHealth) {
        if self.state.mode().await == crate::core::events::SystemMode::Emergency {
            info!(
                "recovery for {} skipped: emergency mode is terminal",
                component
            );
            return;
        }

        let action = action_for_status(status);
        if action == RecoveryAction::None {
            return;
        }

        {
            let mut last_attempt = self.last_attempt.write().await;
            if let Some(last) = *last_attempt {
                if last.elapsed() < self.cooldown {
                    info!(
                        "recovery for {} skipped: cooldown ({}s remaining)",
                        component,
                        (self.cooldown - last.elapsed()).as_secs()
                    );
                    return;
                }
            }
            *last_attempt = Some(Instant::now());
        }

        info!(
            "recovering component {} ({:?}) with {:?}",
            component, status, action
        );

        let handler: Arc<dyn RecoveryHandler> = {
            let handlers = self.handlers.read().await;
            handlers
                .get(component)
                .cloned()
                .unwrap_or_else(|| Arc::new(NoopRecoveryHandler))
        };

        // Handler I/O stays outside every lock
        let result = handler.execute(action).await;

        if action == RecoveryAction::Stop {
            self.monitor.set_enabled(component, false).await;
        }

        match result {
            Ok(()) => {
                self.record_event(RecoveryEvent::new(
                    component,
                    action,
                    true,
                    format!("{:?} succeeded", action),
                ))
                .await;
                self.state.reset_recovery_failures().await;
                self.state
                    .ledger()
                    .mark_resolved(category_for_component(component))
                    .await;
            }
            Err(error) => {
                self.record_event(RecoveryEvent::new(
                    component,
                    action,
                    false,
                    error.to_string(),
                ))
                .await;
                let streak = self.state.record_recovery_failure().await;
                warn!(
                    "recovery of {} failed ({}/{}): {}",
                    component, streak, EMERGENCY_THRESHOLD, error
                );
                if streak >= EMERGENCY_THRESHOLD {
                    self.state.enter_emergency().await;
                    self.handler
                        .report(
                            ErrorCategory::System,
                            ErrorSeverity::Critical,
                            format!(
                                "{} consecutive recovery failures, entering emergency mode",
                                streak
                            ),
                            component,
                        )
                        .await;
                }
            }
        }
    }

    /// Recovery-queue sweep: re-attempt components still at Critical or worse
    ///
    /// The cooldown still applies, so at most one attempt per window.
    pub async fn process_queue(&self) {
        if self.state.mode().await == crate::core::events::SystemMode::Emergency {
            return;
        }
        let pending = self
            .monitor
            .components_at_or_above(SystemHealth::Critical)
            .await;
        for (component, status) in pending {
            self.trigger_recovery(&component, status).await;
        }
    }

    async fn record_event(&self, event: RecoveryEvent) {
        let mut history = self.history.write().await;
        history.push_back(event);
        while history.len() > HISTORY_CAPACITY {
            history.pop_front();
        }
    }

    /// Most recent `n` recovery events, newest first
    pub async fn recent_events(&self, n: usize) -> Vec<RecoveryEvent> {
        let history = self.history.read().await;
        history.iter().rev().take(n).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::SystemMode;

    struct FailingHandler;

    #[async_trait]
    impl RecoveryHandler for FailingHandler {
        async fn execute(&self, action: RecoveryAction) -> Result<(), CoreError> {
            Err(CoreError::Host(format!("{:?} rejected by host", action)))
        }
    }

    fn orchestrator(cooldown: Duration) -> (Arc<HealthState>, RecoveryOrchestrator) {
        let state = Arc::new(HealthState::new());
        let handler = Arc::new(ErrorHandler::new(state.clone()));
        let monitor = Arc::new(HealthMonitor::new(state.clone(), handler.clone()));
        let orchestrator = RecoveryOrchestrator::new(state.clone(), monitor, handler, cooldown);
        (state, orchestrator)
    }

    #[test]
    fn test_action_selection() {
        assert_eq!(action_for_status(SystemHealth::Failed), RecoveryAction::Restart);
        assert_eq!(action_for_status(SystemHealth::Critical), RecoveryAction::Fallback);
        assert_eq!(action_for_status(SystemHealth::Degraded), RecoveryAction::Retry);
        assert_eq!(action_for_status(SystemHealth::Warning), RecoveryAction::None);
        assert_eq!(action_for_status(SystemHealth::Healthy), RecoveryAction::None);
    }

    #[tokio::test]
    async fn test_cooldown_allows_one_attempt() {
        let (_state, orchestrator) = orchestrator(Duration::from_secs(60));

        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Failed)
            .await;
        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Failed)
            .await;

        let events = orchestrator.recent_events(10).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, RecoveryAction::Restart);
        assert!(events[0].success);
    }

    #[tokio::test]
    async fn test_three_failures_enter_emergency() {
        let (state, orchestrator) = orchestrator(Duration::ZERO);
        orchestrator
            .register_handler("data_feed", Arc::new(FailingHandler))
            .await;

        for _ in 0..3 {
            orchestrator
                .trigger_recovery("data_feed", SystemHealth::Failed)
                .await;
        }
        assert_eq!(state.mode().await, SystemMode::Emergency);

        // A later successful attempt must not exit Emergency automatically
        orchestrator
            .register_handler("data_feed", Arc::new(NoopRecoveryHandler))
            .await;
        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Failed)
            .await;
        assert_eq!(state.mode().await, SystemMode::Emergency);

        // The terminal-mode skip records no new event
        let events = orchestrator.recent_events(10).await;
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| !e.success));
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let (state, orchestrator) = orchestrator(Duration::ZERO);
        orchestrator
            .register_handler("data_feed", Arc::new(FailingHandler))
            .await;

        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Failed)
            .await;
        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Failed)
            .await;
        assert_eq!(state.consecutive_failures().await, 2);

        orchestrator
            .register_handler("data_feed", Arc::new(NoopRecoveryHandler))
            .await;
        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Failed)
            .await;
        assert_eq!(state.consecutive_failures().await, 0);
        assert_eq!(state.mode().await, SystemMode::Normal);
    }

    #[tokio::test]
    async fn test_no_action_below_degraded() {
        let (_state, orchestrator) = orchestrator(Duration::ZERO);
        orchestrator
            .trigger_recovery("data_feed", SystemHealth::Warning)
            .await;
        assert!(orchestrator.recent_events(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_history_capacity_bounded() {
        let (_state, orchestrator) = orchestrator(Duration::ZERO);
        for _ in 0..HISTORY_CAPACITY + 10 {
            orchestrator
                .trigger_recovery("data_feed", SystemHealth::Degraded)
                .await;
        }
        let events = orchestrator.recent_events(HISTORY_CAPACITY + 10).await;
        assert_eq!(events.len(), HISTORY_CAPACITY);
    }
}
