use crate::config::{RiskConfig, SupervisorConfig};
use crate::core::events::{
    ComponentHealth, ErrorEvent, RecoveryEvent, SystemHealth, SystemMode, TradeDirection,
};
use crate::core::CoreError;
use crate::execution::{ExecutionCoordinator, ExecutionOutcome};
use crate::health::{
    ClockSyncProbe, DataFeedProbe, ErrorHandler, HealthMonitor, HealthState, RecoveryHandler,
    RecoveryOrchestrator, RiskEngineProbe, TradingEngineProbe,
};
use crate::host::{AccountSource, MarketData, OrderGateway};
use crate::risk::RiskEngine;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Work items for the supervisor loop
///
/// Both timers post into one queue, so health sweeps and recovery sweeps
/// never run concurrently with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    HealthTick,
    RecoveryTick,
}

const COMMAND_QUEUE_DEPTH: usize = 16;

/// Owns the full runtime: health monitoring, recovery, risk, and execution
///
/// Construction wires every component against one shared [`HealthState`];
/// [`start`](Supervisor::start) registers the standard probes and brings up
/// the periodic sweeps.
pub struct Supervisor {
    config: SupervisorConfig,
    symbol: String,
    market: Arc<dyn MarketData>,
    account: Arc<dyn AccountSource>,
    state: Arc<HealthState>,
    monitor: Arc<HealthMonitor>,
    orchestrator: Arc<RecoveryOrchestrator>,
    coordinator: Arc<ExecutionCoordinator>,
    tx: mpsc::Sender<Command>,
    rx: Mutex<Option<mpsc::Receiver<Command>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Supervisor {
    /// Build the supervisor; the only fallible step is config validation
    pub fn new(
        risk_config: RiskConfig,
        config: SupervisorConfig,
        symbol: impl Into<String>,
        market: Arc<dyn MarketData>,
        account: Arc<dyn AccountSource>,
        gateway: Arc<dyn OrderGateway>,
    ) -> Result<Self, CoreError> {
        let state = Arc::new(HealthState::new());
        let handler = Arc::new(ErrorHandler::new(state.clone()));
        let monitor = Arc::new(HealthMonitor::new(state.clone(), handler.clone()));
        let orchestrator = Arc::new(RecoveryOrchestrator::new(
            state.clone(),
            monitor.clone(),
            handler.clone(),
            config.recovery_cooldown,
        ));
        let risk = Arc::new(RiskEngine::new(
            risk_config,
            market.clone(),
            account.clone(),
            handler.clone(),
        )?);
        let coordinator = Arc::new(ExecutionCoordinator::new(
            risk,
            market.clone(),
            gateway,
            state.clone(),
            handler,
        ));

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        Ok(Self {
            config,
            symbol: symbol.into(),
            market,
            account,
            state,
            monitor,
            orchestrator,
            coordinator,
            tx,
            rx: Mutex::new(Some(rx)),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Register the standard component probes
    pub async fn register_default_probes(&self) {
        self.monitor
            .register(Arc::new(TradingEngineProbe::new(self.account.clone())))
            .await;
        self.monitor
            .register(Arc::new(RiskEngineProbe::new(self.account.clone())))
            .await;
        self.monitor
            .register(Arc::new(DataFeedProbe::new(
                self.market.clone(),
                self.symbol.clone(),
                self.config.stale_bar_limit,
            )))
            .await;
        self.monitor
            .register(Arc::new(ClockSyncProbe::new(
                self.market.clone(),
                self.config.clock_skew_limit,
            )))
            .await;
    }

    /// Register the standard probes and spawn the periodic sweeps
    pub async fn start(self: &Arc<Self>) {
        let rx = match self.rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                warn!("supervisor already started");
                return;
            }
        };

        self.register_default_probes().await;

        let mut tasks = self.tasks.lock().await;
        tasks.push(self.spawn_timer(self.config.health_check_interval, Command::HealthTick));
        tasks.push(self.spawn_timer(self.config.recovery_queue_interval, Command::RecoveryTick));
        tasks.push(self.spawn_worker(rx));
        info!(
            "supervisor started (health sweep every {:?}, recovery sweep every {:?})",
            self.config.health_check_interval, self.config.recovery_queue_interval
        );
    }

    fn spawn_timer(&self, period: std::time::Duration, command: Command) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                // A full queue means the worker is behind; dropping the tick
                // is fine, the next one carries the same meaning
                if tx.try_send(command).is_err() && tx.is_closed() {
                    break;
                }
            }
        })
    }

    fn spawn_worker(self: &Arc<Self>, mut rx: mpsc::Receiver<Command>) -> JoinHandle<()> {
        let supervisor = self.clone();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::HealthTick => supervisor.run_health_check().await,
                    Command::RecoveryTick => supervisor.run_recovery_sweep().await,
                }
            }
        })
    }

    /// One probe sweep; escalations feed straight into recovery
    pub async fn run_health_check(&self) {
        let escalations = self.monitor.run_checks().await;
        for (component, status) in escalations {
            self.orchestrator.trigger_recovery(&component, status).await;
        }
    }

    /// One recovery-queue sweep over components still at Critical or worse
    pub async fn run_recovery_sweep(&self) {
        self.orchestrator.process_queue().await;
    }

    /// Stop the periodic sweeps; state and history stay readable
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("supervisor stopped");
    }

    /// Attempt a market entry through the health gate and risk engine
    pub async fn execute_entry(&self, symbol: &str, direction: TradeDirection) -> ExecutionOutcome {
        self.coordinator.execute_entry(symbol, direction).await
    }

    pub async fn system_health(&self) -> SystemHealth {
        self.state.system_health().await
    }

    pub async fn mode(&self) -> SystemMode {
        self.state.mode().await
    }

    pub async fn is_in_recovery_mode(&self) -> bool {
        self.state.is_in_recovery_mode().await
    }

    pub async fn component_health(&self, name: &str) -> Option<ComponentHealth> {
        self.monitor.component_health(name).await
    }

    pub async fn recent_errors(&self, n: usize) -> Vec<ErrorEvent> {
        self.state.ledger().recent_errors(n).await
    }

    pub async fn recent_recovery_events(&self, n: usize) -> Vec<RecoveryEvent> {
        self.orchestrator.recent_events(n).await
    }

    /// External intervention hook: leave Emergency Mode
    pub async fn reset_emergency(&self) {
        self.state.reset_emergency().await;
    }

    /// Replace the no-op recovery handler for one component
    pub async fn register_recovery_handler(
        &self,
        component: &str,
        handler: Arc<dyn RecoveryHandler>,
    ) {
        self.orchestrator.register_handler(component, handler).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probes;
    use crate::host::MockHost;
    use rust_decimal::Decimal;

    fn supervisor() -> (Arc<MockHost>, Arc<Supervisor>) {
        let host = Arc::new(MockHost::new());
        let supervisor = Supervisor::new(
            RiskConfig::default(),
            SupervisorConfig::default(),
            "EURUSD",
            host.clone(),
            host.clone(),
            host.clone(),
        )
        .expect("valid config");
        (host, Arc::new(supervisor))
    }

    #[tokio::test]
    async fn test_invalid_config_fails_construction() {
        let host = Arc::new(MockHost::new());
        let mut config = RiskConfig::default();
        config.default_stop_loss_pips = 0;
        let result = Supervisor::new(
            config,
            SupervisorConfig::default(),
            "EURUSD",
            host.clone(),
            host.clone(),
            host,
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_health_check_covers_default_probes() {
        let (_host, supervisor) = supervisor();
        supervisor.register_default_probes().await;
        supervisor.run_health_check().await;

        for name in [
            probes::TRADING_ENGINE,
            probes::RISK_ENGINE,
            probes::DATA_FEED,
            probes::NETWORK,
        ] {
            let health = supervisor.component_health(name).await.unwrap();
            assert_eq!(health.status, SystemHealth::Healthy);
        }
        assert_eq!(supervisor.system_health().await, SystemHealth::Healthy);
        assert_eq!(supervisor.mode().await, SystemMode::Normal);
    }

    #[tokio::test]
    async fn test_margin_squeeze_enters_recovery_mode() {
        // Free margin under 10% of equity trips the risk-engine probe
        let (host, supervisor) = supervisor();
        supervisor.register_default_probes().await;

        host.set_account(crate::core::events::AccountSnapshot {
            equity: Decimal::new(10_000, 0),
            balance: Decimal::new(10_000, 0),
            free_margin: Decimal::new(500, 0),
            margin_level: Decimal::new(200, 0),
        })
        .await;
        supervisor.run_health_check().await;

        assert!(supervisor.is_in_recovery_mode().await);
        let health = supervisor.component_health(probes::RISK_ENGINE).await.unwrap();
        assert_eq!(health.status, SystemHealth::Critical);
        // The escalation produced a recovery attempt
        assert_eq!(supervisor.recent_recovery_events(10).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_start_and_shutdown() {
        let (_host, supervisor) = supervisor();
        supervisor.start().await;
        supervisor.start().await; // second start is a no-op
        supervisor.shutdown().await;
        assert_eq!(supervisor.system_health().await, SystemHealth::Healthy);
    }
}
