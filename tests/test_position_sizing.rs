use fx_sentinel::config::{AccountBasis, RiskConfig, SizeMode, TargetMode};
use fx_sentinel::core::events::{AccountSnapshot, Timeframe, TradeDirection};
use fx_sentinel::health::{ErrorHandler, HealthState};
use fx_sentinel::host::{MarketData, MockHost};
use fx_sentinel::risk::RiskEngine;
use fx_sentinel::types::Lots;
use rust_decimal::Decimal;
use std::sync::Arc;

fn engine(config: RiskConfig) -> (Arc<MockHost>, RiskEngine) {
    let host = Arc::new(MockHost::new());
    let state = Arc::new(HealthState::new());
    let handler = Arc::new(ErrorHandler::new(state));
    let engine =
        RiskEngine::new(config, host.clone(), host.clone(), handler).expect("valid config");
    (host, engine)
}

async fn run(engine: &RiskEngine, host: &MockHost) -> fx_sentinel::RiskDecision {
    let instrument = host.instrument("EURUSD").await.unwrap();
    engine.run(&instrument, TradeDirection::Buy).await
}

#[tokio::test]
async fn test_fixed_lots_sizing_passes_through() {
    let mut config = RiskConfig::default();
    config.fixed_lots = Lots::from_str("0.05").unwrap();
    let (host, engine) = engine(config);

    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.position_size, Lots::from_str("0.05").unwrap());
}

#[tokio::test]
async fn test_auto_sizing_risks_configured_percent() {
    let mut config = RiskConfig::default();
    config.size_mode = SizeMode::Auto;
    config.risk_percent = Decimal::ONE;
    config.account_basis = AccountBasis::Equity;
    let (host, engine) = engine(config);

    // 1% of 10000 equity = 100; 100 / (30 pips * 10 per pip) = 0.33 lots
    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.position_size, Lots::from_str("0.33").unwrap());
}

#[tokio::test]
async fn test_step_sizing_grows_with_balance() {
    let mut config = RiskConfig::default();
    config.size_mode = SizeMode::FixedLotsStep;
    config.base_lots = Lots::from_str("0.01").unwrap();
    config.balance_increment = Decimal::new(1_000, 0);
    config.lot_increment = Lots::from_str("0.01").unwrap();
    let (host, engine) = engine(config);

    host.set_account(AccountSnapshot {
        equity: Decimal::new(25_000, 0),
        balance: Decimal::new(25_000, 0),
        free_margin: Decimal::new(24_000, 0),
        margin_level: Decimal::new(1_000, 0),
    })
    .await;

    // 0.01 + floor(25000/1000) * 0.01 = 0.26 lots
    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.position_size, Lots::from_str("0.26").unwrap());
}

#[tokio::test]
async fn test_atr_stop_distance_from_bars() {
    let mut config = RiskConfig::default();
    config.stop_loss_mode = TargetMode::Atr;
    config.atr_period = 14;
    config.atr_multiplier = Decimal::new(15, 1); // 1.5
    let (host, engine) = engine(config);

    // Flat series: every true range is 0.0010, so ATR = 10 pips, stop = 15
    host.set_bars(
        Timeframe::Trading,
        MockHost::flat_bars(20, Decimal::new(11, 1), Decimal::new(1, 3)),
    )
    .await;

    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.stop_loss_pips, 15);
    assert_eq!(decision.take_profit_pips, 60); // take profit stays Fixed
}

#[tokio::test]
async fn test_adr_target_divides_daily_range() {
    let mut config = RiskConfig::default();
    config.take_profit_mode = TargetMode::Adr;
    config.atr_multiplier = Decimal::ONE;
    config.adr_ratio = Decimal::new(3, 0);
    let (host, engine) = engine(config);

    // Daily ATR of 90 pips divided by 3 gives a 30-pip target
    host.set_bars(
        Timeframe::Daily,
        MockHost::flat_bars(20, Decimal::new(11, 1), Decimal::new(9, 3)),
    )
    .await;

    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.take_profit_pips, 30);
    assert_eq!(decision.stop_loss_pips, 30); // stop stays Fixed
}

#[tokio::test]
async fn test_target_mode_none_omits_levels() {
    let mut config = RiskConfig::default();
    config.take_profit_mode = TargetMode::None;
    let (host, engine) = engine(config);

    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.take_profit_pips, 0);
}

#[tokio::test]
async fn test_sub_pip_atr_range_floors_to_default() {
    let mut config = RiskConfig::default();
    config.stop_loss_mode = TargetMode::Atr;
    config.atr_multiplier = Decimal::ONE;
    let (host, engine) = engine(config);

    // True range of 0.00002 per bar rounds to zero pips; the configured
    // default applies instead of a sub-pip stop
    host.set_bars(
        Timeframe::Trading,
        MockHost::flat_bars(20, Decimal::new(11, 1), Decimal::new(2, 5)),
    )
    .await;

    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.stop_loss_pips, 30);
}

#[tokio::test]
async fn test_missing_bars_fall_back_to_fixed_defaults() {
    let mut config = RiskConfig::default();
    config.stop_loss_mode = TargetMode::Atr;
    config.take_profit_mode = TargetMode::Adr;
    let (host, engine) = engine(config);

    // No bar series seeded at all
    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.stop_loss_pips, 30);
    assert_eq!(decision.take_profit_pips, 60);
}

#[tokio::test]
async fn test_aggressive_auto_sizing_hits_equity_risk_cap() {
    let mut config = RiskConfig::default();
    config.size_mode = SizeMode::Auto;
    config.risk_percent = Decimal::new(50, 0);
    let (host, engine) = engine(config);

    // 50% of 10000 = 5000 risked; 5000 / (30 * 10) = 16.67 lots, whose
    // projected risk blows past 10% of equity after sizing
    let decision = run(&engine, &host).await;
    assert!(!decision.is_valid);
    assert!(decision.rejection_reason.unwrap().contains("10% of equity"));
}

#[tokio::test]
async fn test_size_is_normalized_to_broker_step() {
    let mut config = RiskConfig::default();
    config.size_mode = SizeMode::FixedAmount;
    config.fixed_risk_amount = Decimal::new(47, 0);
    let (host, engine) = engine(config);

    // 47 / (30 * 10) = 0.1566..; rounds to the 0.01 step
    let decision = run(&engine, &host).await;
    assert!(decision.is_valid);
    assert_eq!(decision.position_size, Lots::from_str("0.16").unwrap());
}
