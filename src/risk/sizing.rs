use crate::config::{AccountBasis, RiskConfig, SizeMode};
use crate::core::events::{AccountSnapshot, Instrument};
use crate::types::Lots;
use log::debug;
use rust_decimal::Decimal;

/// Resolve the account figure risk-based sizing works from
pub fn account_value(basis: AccountBasis, account: &AccountSnapshot, fixed: Decimal) -> Decimal {
    match basis {
        AccountBasis::Equity => account.equity,
        AccountBasis::Balance => account.balance,
        AccountBasis::FreeMargin => account.free_margin,
        AccountBasis::Fixed => fixed,
    }
}

/// Compute the raw position size for one trade proposal
///
/// A zero stop distance in the risk-based modes falls back to the configured
/// fixed size instead of dividing by zero.
pub fn compute_size(
    config: &RiskConfig,
    account: &AccountSnapshot,
    instrument: &Instrument,
    stop_loss_pips: u32,
) -> Lots {
    match config.size_mode {
        SizeMode::FixedLots => config.fixed_lots,
        SizeMode::Auto => {
            let value = account_value(config.account_basis, account, config.fixed_account_value);
            let risk_amount = value * config.risk_percent / Decimal::new(100, 0);
            risk_based(risk_amount, stop_loss_pips, instrument.pip_value, config.fixed_lots)
        }
        SizeMode::FixedAmount => risk_based(
            config.fixed_risk_amount,
            stop_loss_pips,
            instrument.pip_value,
            config.fixed_lots,
        ),
        SizeMode::FixedLotsStep => {
            let steps = (account.balance / config.balance_increment).floor();
            config.base_lots + config.lot_increment * steps
        }
    }
}

fn risk_based(risk_amount: Decimal, stop_loss_pips: u32, pip_value: Decimal, fallback: Lots) -> Lots {
    if stop_loss_pips == 0 || pip_value <= Decimal::ZERO {
        debug!(
            "risk-based sizing fell back to {} (stop {} pips, pip value {})",
            fallback, stop_loss_pips, pip_value
        );
        return fallback;
    }
    Lots::new(risk_amount / (Decimal::from(stop_loss_pips) * pip_value))
}

/// Normalize a raw size to what the broker accepts: clamp into the volume
/// range and round to the volume step
pub fn normalize(raw: Lots, instrument: &Instrument) -> Lots {
    raw.clamp(instrument.volume_min, instrument.volume_max)
        .round_to_step(instrument.volume_step)
        .clamp(instrument.volume_min, instrument.volume_max)
}
