use crate::core::events::DirectionFilter;
use crate::core::CoreError;
use crate::types::Lots;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a stop-loss or take-profit distance is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    /// No order-level stop/target
    None,
    /// Configured constant distance in pips
    Fixed,
    /// Average True Range on the trading timeframe, times a multiplier
    Atr,
    /// ATR on the daily timeframe divided by a ratio, times a multiplier
    Adr,
}

/// How the position size is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeMode {
    /// Configured constant volume
    FixedLots,
    /// Risk a percentage of the account value
    Auto,
    /// Risk a fixed monetary amount
    FixedAmount,
    /// Base volume plus one lot increment per balance increment
    FixedLotsStep,
}

/// Which account figure risk-based sizing is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountBasis {
    Equity,
    Balance,
    FreeMargin,
    /// A fixed configured value, independent of the live account
    Fixed,
}

/// Allowed trading hours on the server clock
///
/// `start > end` describes an overnight session that wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TradingWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Check whether an hour falls inside the window
    ///
    /// `start == end` means trading around the clock.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour == self.end_hour {
            true
        } else if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour <= self.end_hour
        } else {
            // Overnight session, e.g. 22 -> 6
            hour >= self.start_hour || hour <= self.end_hour
        }
    }
}

/// Risk engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub direction_filter: DirectionFilter,
    /// Maximum tolerated spread, in pips; equal is still acceptable
    pub max_spread_pips: Decimal,
    pub trading_window: TradingWindow,

    pub stop_loss_mode: TargetMode,
    pub take_profit_mode: TargetMode,
    pub default_stop_loss_pips: u32,
    pub default_take_profit_pips: u32,
    pub atr_period: usize,
    pub atr_multiplier: Decimal,
    /// Divisor applied to the daily range in Adr mode
    pub adr_ratio: Decimal,

    pub size_mode: SizeMode,
    pub fixed_lots: Lots,
    pub risk_percent: Decimal,
    pub fixed_risk_amount: Decimal,
    pub account_basis: AccountBasis,
    pub fixed_account_value: Decimal,
    pub base_lots: Lots,
    pub balance_increment: Decimal,
    pub lot_increment: Lots,

    /// Absolute free-margin floor below which trades are rejected
    pub min_free_margin: Decimal,
    /// Balance the emergency-stop check compares equity against;
    /// None means the live account balance is used
    pub emergency_reference_balance: Option<Decimal>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            direction_filter: DirectionFilter::Both,
            max_spread_pips: Decimal::new(3, 0),
            trading_window: TradingWindow::new(0, 0),
            stop_loss_mode: TargetMode::Fixed,
            take_profit_mode: TargetMode::Fixed,
            default_stop_loss_pips: 30,
            default_take_profit_pips: 60,
            atr_period: 14,
            atr_multiplier: Decimal::new(15, 1), // 1.5
            adr_ratio: Decimal::new(3, 0),
            size_mode: SizeMode::FixedLots,
            fixed_lots: Lots(Decimal::new(1, 2)), // 0.01
            risk_percent: Decimal::ONE,
            fixed_risk_amount: Decimal::new(100, 0),
            account_basis: AccountBasis::Equity,
            fixed_account_value: Decimal::new(10_000, 0),
            base_lots: Lots(Decimal::new(1, 2)),
            balance_increment: Decimal::new(1_000, 0),
            lot_increment: Lots(Decimal::new(1, 2)),
            min_free_margin: Decimal::new(100, 0),
            emergency_reference_balance: None,
        }
    }
}

impl RiskConfig {
    /// Validate the configuration at startup
    ///
    /// Returns a fatal `Config` error; this is the one path where errors are
    /// allowed to escape the core so the host learns initialization failed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.trading_window.start_hour > 23 || self.trading_window.end_hour > 23 {
            return Err(CoreError::Config(format!(
                "trading window hours must be 0..=23, got {}..{}",
                self.trading_window.start_hour, self.trading_window.end_hour
            )));
        }
        if self.max_spread_pips < Decimal::ZERO {
            return Err(CoreError::Config(format!(
                "max_spread_pips must not be negative, got {}",
                self.max_spread_pips
            )));
        }
        if self.default_stop_loss_pips == 0 || self.default_stop_loss_pips > 1000 {
            return Err(CoreError::Config(format!(
                "default_stop_loss_pips must be within 1..=1000, got {}",
                self.default_stop_loss_pips
            )));
        }
        if self.atr_period == 0 {
            return Err(CoreError::Config(
                "atr_period must be at least 1".to_string(),
            ));
        }
        if self.adr_ratio <= Decimal::ZERO {
            return Err(CoreError::Config(format!(
                "adr_ratio must be positive, got {}",
                self.adr_ratio
            )));
        }
        if self.fixed_lots.value() <= Decimal::ZERO {
            return Err(CoreError::Config(format!(
                "fixed_lots must be positive, got {}",
                self.fixed_lots
            )));
        }
        if self.risk_percent <= Decimal::ZERO || self.risk_percent > Decimal::new(100, 0) {
            return Err(CoreError::Config(format!(
                "risk_percent must be within (0, 100], got {}",
                self.risk_percent
            )));
        }
        if self.size_mode == SizeMode::FixedLotsStep && self.balance_increment <= Decimal::ZERO {
            return Err(CoreError::Config(format!(
                "balance_increment must be positive for step sizing, got {}",
                self.balance_increment
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &str) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {}", path, e)))?;
        let config: RiskConfig = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("cannot parse {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }
}

/// Supervisor scheduling configuration
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Interval between component probe sweeps
    pub health_check_interval: Duration,
    /// Interval between recovery-queue sweeps
    pub recovery_queue_interval: Duration,
    /// Minimum gap between recovery attempts, enforced globally
    pub recovery_cooldown: Duration,
    /// A data feed with no new bar for this long is unhealthy
    pub stale_bar_limit: Duration,
    /// Local and server clocks drifting further apart than this is unhealthy
    pub clock_skew_limit: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(30),
            recovery_queue_interval: Duration::from_secs(10),
            recovery_cooldown: Duration::from_secs(60),
            stale_bar_limit: Duration::from_secs(600),
            clock_skew_limit: Duration::from_secs(300),
        }
    }
}
