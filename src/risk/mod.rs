pub mod engine;
pub mod sizing;
pub mod targets;

pub use engine::{
    RiskEngine, EMERGENCY_EQUITY_FRACTION, MAX_EQUITY_RISK_FRACTION, MIN_MARGIN_LEVEL_PERCENT,
};
