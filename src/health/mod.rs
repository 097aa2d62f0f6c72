pub mod classifier;
pub mod ledger;
pub mod monitor;
pub mod probes;
pub mod recovery;
pub mod state;

pub use classifier::{classify_category, classify_severity, recommended_action, ErrorHandler};
pub use ledger::HealthLedger;
pub use monitor::HealthMonitor;
pub use probes::{ClockSyncProbe, ComponentProbe, DataFeedProbe, RiskEngineProbe, TradingEngineProbe};
pub use recovery::{
    action_for_status, NoopRecoveryHandler, RecoveryHandler, RecoveryOrchestrator,
    EMERGENCY_THRESHOLD,
};
pub use state::HealthState;
