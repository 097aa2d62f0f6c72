use crate::config::{RiskConfig, TargetMode};
use crate::core::events::{
    AccountSnapshot, ErrorCategory, ErrorSeverity, Instrument, RiskDecision, Timeframe,
    TradeDirection,
};
use crate::core::CoreError;
use crate::health::ErrorHandler;
use crate::host::{AccountSource, MarketData};
use crate::risk::sizing;
use crate::risk::targets::{average_true_range, range_to_pips};
use chrono::Timelike;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Trades may risk at most this fraction of equity
/// (candidate for configuration exposure, kept as a constant from the source)
pub const MAX_EQUITY_RISK_FRACTION: Decimal = Decimal::from_parts(1, 0, 0, false, 1); // 0.1
/// Minimum margin level, in percent, required to trade
pub const MIN_MARGIN_LEVEL_PERCENT: Decimal = Decimal::from_parts(150, 0, 0, false, 0);
/// Equity below this fraction of the reference balance trips the
/// emergency stop
pub const EMERGENCY_EQUITY_FRACTION: Decimal = Decimal::from_parts(8, 0, 0, false, 1); // 0.8

/// Risk validation and position-sizing engine
///
/// The public surface never errors: internal failures are classified as
/// Risk-category events and surface as an invalid decision.
pub struct RiskEngine {
    config: RiskConfig,
    market: Arc<dyn MarketData>,
    account: Arc<dyn AccountSource>,
    handler: Arc<ErrorHandler>,
}

impl RiskEngine {
    pub fn new(
        config: RiskConfig,
        market: Arc<dyn MarketData>,
        account: Arc<dyn AccountSource>,
        handler: Arc<ErrorHandler>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            market,
            account,
            handler,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluate one trade proposal
    pub async fn run(&self, instrument: &Instrument, direction: TradeDirection) -> RiskDecision {
        match self.evaluate(instrument, direction).await {
            Ok(decision) => decision,
            Err(error) => {
                let reason = error.to_string();
                self.handler
                    .report(
                        ErrorCategory::Risk,
                        ErrorSeverity::High,
                        reason.clone(),
                        &format!("risk evaluation for {}", instrument.symbol),
                    )
                    .await;
                RiskDecision::rejected(reason)
            }
        }
    }

    async fn evaluate(
        &self,
        instrument: &Instrument,
        direction: TradeDirection,
    ) -> Result<RiskDecision, CoreError> {
        // Fresh snapshot per decision, never cached across calls
        let account = self.account.snapshot().await?;

        if let Some(reason) = self.validate_trade(instrument, direction, &account).await {
            warn!("trade rejected for {}: {}", instrument.symbol, reason);
            return Ok(RiskDecision::rejected(reason));
        }

        let stop_loss_pips = self
            .target_pips(
                instrument,
                self.config.stop_loss_mode,
                self.config.default_stop_loss_pips,
            )
            .await;
        let take_profit_pips = self
            .target_pips(
                instrument,
                self.config.take_profit_mode,
                self.config.default_take_profit_pips,
            )
            .await;

        let raw = sizing::compute_size(&self.config, &account, instrument, stop_loss_pips);
        let size = sizing::normalize(raw, instrument);
        debug!(
            "sized {} {:?}: raw {} -> {} lots, sl {} pips, tp {} pips",
            instrument.symbol, direction, raw, size, stop_loss_pips, take_profit_pips
        );

        // The sized volume gets the same equity-risk cap the candidate did;
        // an aggressive risk_percent must not out-size the gate
        let projected_risk =
            size.value() * Decimal::from(stop_loss_pips) * instrument.pip_value;
        let risk_limit = account.equity * MAX_EQUITY_RISK_FRACTION;
        if projected_risk > risk_limit {
            let reason = format!(
                "sized position risks {}, exceeding {} (10% of equity)",
                projected_risk, risk_limit
            );
            warn!("trade rejected for {}: {}", instrument.symbol, reason);
            return Ok(RiskDecision::rejected(reason));
        }

        Ok(RiskDecision::approved(size, stop_loss_pips, take_profit_pips))
    }

    /// The nine-check validation gate; first failure rejects the trade
    async fn validate_trade(
        &self,
        instrument: &Instrument,
        direction: TradeDirection,
        account: &AccountSnapshot,
    ) -> Option<String> {
        // 1. Instrument sanity
        if instrument.pip_size <= Decimal::ZERO || instrument.digits == 0 {
            return Some(format!(
                "instrument metadata invalid: pip size {}, digits {}",
                instrument.pip_size, instrument.digits
            ));
        }

        // 2. Configured volume within broker limits
        let candidate = self.config.fixed_lots;
        if candidate < instrument.volume_min || candidate > instrument.volume_max {
            return Some(format!(
                "lot size {} outside broker limits [{}, {}]",
                candidate, instrument.volume_min, instrument.volume_max
            ));
        }

        // 3. Stop distance plausibility
        let stop_pips = self.config.default_stop_loss_pips;
        if stop_pips == 0 || stop_pips > 1000 {
            return Some(format!("stop distance {} pips outside 1..=1000", stop_pips));
        }

        // 4. Spread gate; equal to the maximum is still acceptable
        let spread_pips = instrument.spread_in_pips();
        if spread_pips > self.config.max_spread_pips {
            return Some(format!(
                "spread exceeds maximum: {} > {} pips",
                spread_pips, self.config.max_spread_pips
            ));
        }

        // 5. Trading-hour window on the server clock
        let hour = self.market.server_time().await.hour();
        if !self.config.trading_window.contains(hour) {
            return Some(format!(
                "hour {} outside trading window {}..{}",
                hour, self.config.trading_window.start_hour, self.config.trading_window.end_hour
            ));
        }

        // 6. Direction restriction
        if !self.config.direction_filter.permits(direction) {
            return Some(format!(
                "direction {:?} not permitted by {:?}",
                direction, self.config.direction_filter
            ));
        }

        // 7. Projected monetary risk against equity
        let projected_risk =
            candidate.value() * Decimal::from(stop_pips) * instrument.pip_value;
        let risk_limit = account.equity * MAX_EQUITY_RISK_FRACTION;
        if projected_risk > risk_limit {
            return Some(format!(
                "projected risk {} exceeds {} (10% of equity)",
                projected_risk, risk_limit
            ));
        }

        // 8. Account health
        if account.margin_level < MIN_MARGIN_LEVEL_PERCENT {
            return Some(format!(
                "margin level {}% below minimum {}%",
                account.margin_level, MIN_MARGIN_LEVEL_PERCENT
            ));
        }
        if account.free_margin < self.config.min_free_margin {
            return Some(format!(
                "free margin {} below floor {}",
                account.free_margin, self.config.min_free_margin
            ));
        }

        // 9. Emergency stop; evaluation trouble fails safe
        if self.emergency_stop_active(account) {
            return Some("emergency stop active: equity below 80% of reference balance".to_string());
        }

        None
    }

    /// Equity below 80% of the reference balance stops all trading
    ///
    /// An unevaluable reference (zero or negative) is treated as tripped.
    fn emergency_stop_active(&self, account: &AccountSnapshot) -> bool {
        let reference = self
            .config
            .emergency_reference_balance
            .unwrap_or(account.balance);
        if reference <= Decimal::ZERO {
            return true;
        }
        account.equity < reference * EMERGENCY_EQUITY_FRACTION
    }

    /// Stop/target distance for one mode, in whole pips
    ///
    /// Indicator failures and sub-pip results fall back to the configured
    /// default instead of propagating.
    async fn target_pips(
        &self,
        instrument: &Instrument,
        mode: TargetMode,
        default_pips: u32,
    ) -> u32 {
        match mode {
            TargetMode::None => 0,
            TargetMode::Fixed => default_pips,
            TargetMode::Atr => {
                self.indicator_pips(instrument, Timeframe::Trading, Decimal::ONE, default_pips)
                    .await
            }
            TargetMode::Adr => {
                self.indicator_pips(instrument, Timeframe::Daily, self.config.adr_ratio, default_pips)
                    .await
            }
        }
    }

    async fn indicator_pips(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        divisor: Decimal,
        default_pips: u32,
    ) -> u32 {
        let result: Result<u32, CoreError> = async {
            let bars = self
                .market
                .bars(&instrument.symbol, timeframe, self.config.atr_period + 1)
                .await?;
            let atr = average_true_range(&bars, self.config.atr_period)?;
            range_to_pips(atr / divisor, self.config.atr_multiplier, instrument.pip_size)
        }
        .await;

        match result {
            Ok(pips) if pips >= 1 => pips,
            Ok(pips) => {
                debug!(
                    "{:?} target rounded to {} pips, using default {}",
                    timeframe, pips, default_pips
                );
                default_pips
            }
            Err(error) => {
                warn!(
                    "{:?} target unavailable ({}), using default {}",
                    timeframe, error, default_pips
                );
                default_pips
            }
        }
    }
}
