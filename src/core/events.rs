use crate::types::{Lots, Price};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Configured restriction on which directions may be traded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionFilter {
    Both,
    BuyOnly,
    SellOnly,
}

impl DirectionFilter {
    /// Check whether a requested direction is permitted
    pub fn permits(&self, direction: TradeDirection) -> bool {
        match self {
            DirectionFilter::Both => true,
            DirectionFilter::BuyOnly => direction == TradeDirection::Buy,
            DirectionFilter::SellOnly => direction == TradeDirection::Sell,
        }
    }
}

/// Aggregate system health, ordered by increasing severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemHealth {
    Healthy,
    Warning,
    Degraded,
    Critical,
    Failed,
}

/// Global operating mode
///
/// Normal -> Recovery when any component degrades; Recovery -> Normal once all
/// components are healthy again; Recovery -> Emergency after repeated failed
/// recovery attempts. Emergency is terminal until external intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemMode {
    Normal,
    Recovery,
    Emergency,
}

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    System,
    Trading,
    Network,
    Data,
    Strategy,
    Risk,
    Configuration,
    External,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 8] = [
        ErrorCategory::System,
        ErrorCategory::Trading,
        ErrorCategory::Network,
        ErrorCategory::Data,
        ErrorCategory::Strategy,
        ErrorCategory::Risk,
        ErrorCategory::Configuration,
        ErrorCategory::External,
    ];
}

/// Error severity, ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Recovery action recommended for an error or a degraded component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    None,
    Retry,
    Fallback,
    Restart,
    Alert,
    Stop,
}

/// A classified error observed by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: String,
    pub recommended_action: RecoveryAction,
    pub resolved: bool,
}

impl ErrorEvent {
    pub fn new(
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: impl Into<String>,
        context: impl Into<String>,
        recommended_action: RecoveryAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            category,
            severity,
            message: message.into(),
            context: context.into(),
            recommended_action,
            resolved: false,
        }
    }
}

/// Outcome of one recovery attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub component_name: String,
    pub action: RecoveryAction,
    pub success: bool,
    pub details: String,
}

impl RecoveryEvent {
    pub fn new(
        component_name: impl Into<String>,
        action: RecoveryAction,
        success: bool,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            component_name: component_name.into(),
            action,
            success,
            details: details.into(),
        }
    }
}

/// Per-component health record maintained by the health monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: SystemHealth,
    pub last_check_time: DateTime<Utc>,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub failure_count: u32,
    pub enabled: bool,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SystemHealth::Healthy,
            last_check_time: Utc::now(),
            last_failure_time: None,
            failure_count: 0,
            enabled: true,
        }
    }
}

/// Decision produced by the risk engine for one trade proposal
///
/// An invalid decision always carries zero size and zero stop/target distances
/// and must never be forwarded to order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    pub is_valid: bool,
    pub position_size: Lots,
    pub stop_loss_pips: u32,
    pub take_profit_pips: u32,
    pub rejection_reason: Option<String>,
}

impl RiskDecision {
    /// Create an approved decision
    pub fn approved(position_size: Lots, stop_loss_pips: u32, take_profit_pips: u32) -> Self {
        Self {
            is_valid: true,
            position_size,
            stop_loss_pips,
            take_profit_pips,
            rejection_reason: None,
        }
    }

    /// Create a rejected decision; numeric fields are zeroed
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            position_size: Lots::ZERO,
            stop_loss_pips: 0,
            take_profit_pips: 0,
            rejection_reason: Some(reason.into()),
        }
    }
}

/// Instrument metadata owned by the host, read-only to the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    /// Smallest standardized price increment, e.g. 0.0001 for EURUSD
    pub pip_size: Decimal,
    /// Price digit precision
    pub digits: u32,
    /// Current spread in raw price units
    pub spread: Decimal,
    pub volume_min: Lots,
    pub volume_max: Lots,
    pub volume_step: Lots,
    /// Monetary value of one pip for one lot, contract size included
    pub pip_value: Decimal,
}

impl Instrument {
    /// Current spread expressed in pips
    pub fn spread_in_pips(&self) -> Decimal {
        if self.pip_size.is_zero() {
            return Decimal::ZERO;
        }
        self.spread / self.pip_size
    }
}

/// Read-only view of the account, fetched fresh per decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity: Decimal,
    pub balance: Decimal,
    pub free_margin: Decimal,
    /// Equity / used margin, as a percentage
    pub margin_level: Decimal,
}

/// One OHLC bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

/// Bar series requested from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// The timeframe the agent trades on
    Trading,
    /// Daily bars, used for average-daily-range targets
    Daily,
}

/// Order forwarded to the host platform after risk approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub symbol: String,
    pub direction: TradeDirection,
    pub volume: Lots,
    /// Zero means no order-level stop
    pub stop_loss_pips: u32,
    /// Zero means no order-level target
    pub take_profit_pips: u32,
    pub client_order_id: Uuid,
}

impl TradeOrder {
    pub fn from_decision(
        symbol: impl Into<String>,
        direction: TradeDirection,
        decision: &RiskDecision,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            volume: decision.position_size,
            stop_loss_pips: decision.stop_loss_pips,
            take_profit_pips: decision.take_profit_pips,
            client_order_id: Uuid::new_v4(),
        }
    }
}

/// Handle to a position opened by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHandle {
    pub position_id: String,
    pub symbol: String,
    pub direction: TradeDirection,
    pub volume: Lots,
    pub entry_price: Price,
}
