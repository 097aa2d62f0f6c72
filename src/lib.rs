pub mod config;
pub mod core;
pub mod execution;
pub mod health;
pub mod host;
pub mod realtime;
pub mod risk;
pub mod types;

pub use config::{RiskConfig, SupervisorConfig};
pub use crate::core::events::{
    ErrorCategory, ErrorSeverity, RecoveryAction, RiskDecision, SystemHealth, SystemMode,
    TradeDirection,
};
pub use crate::core::CoreError;
pub use execution::{ExecutionCoordinator, ExecutionOutcome};
pub use health::{ErrorHandler, HealthMonitor, HealthState, RecoveryOrchestrator};
pub use realtime::Supervisor;
pub use risk::RiskEngine;
pub use types::{Lots, Price};

/// Initialize logging to stdout and optionally a file
pub fn init_logging(level: &str, log_file: Option<&str>) -> Result<(), fern::InitError> {
    let level = level.parse().unwrap_or(log::LevelFilter::Info);
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}
