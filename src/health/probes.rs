use crate::core::events::SystemHealth;
use crate::core::CoreError;
use crate::host::{AccountSource, MarketData};
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Well-known component names
pub const TRADING_ENGINE: &str = "trading_engine";
pub const RISK_ENGINE: &str = "risk_engine";
pub const DATA_FEED: &str = "data_feed";
pub const NETWORK: &str = "network";

/// A component-specific health check
#[async_trait]
pub trait ComponentProbe: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate the component; an error is treated as a failed probe
    async fn probe(&self) -> Result<SystemHealth, CoreError>;
}

/// The trading engine is healthy when account data can be read
pub struct TradingEngineProbe {
    account: Arc<dyn AccountSource>,
}

impl TradingEngineProbe {
    pub fn new(account: Arc<dyn AccountSource>) -> Self {
        Self { account }
    }
}

#[async_trait]
impl ComponentProbe for TradingEngineProbe {
    fn name(&self) -> &str {
        TRADING_ENGINE
    }

    async fn probe(&self) -> Result<SystemHealth, CoreError> {
        self.account.snapshot().await?;
        Ok(SystemHealth::Healthy)
    }
}

/// The risk engine is healthy while free margin stays above 10% of equity
pub struct RiskEngineProbe {
    account: Arc<dyn AccountSource>,
}

impl RiskEngineProbe {
    pub fn new(account: Arc<dyn AccountSource>) -> Self {
        Self { account }
    }
}

#[async_trait]
impl ComponentProbe for RiskEngineProbe {
    fn name(&self) -> &str {
        RISK_ENGINE
    }

    async fn probe(&self) -> Result<SystemHealth, CoreError> {
        let snapshot = self.account.snapshot().await?;
        let floor = snapshot.equity * Decimal::new(1, 1); // 10% of equity
        if snapshot.free_margin < floor {
            Ok(SystemHealth::Critical)
        } else {
            Ok(SystemHealth::Healthy)
        }
    }
}

/// The data feed is healthy while fresh bars keep arriving
pub struct DataFeedProbe {
    market: Arc<dyn MarketData>,
    symbol: String,
    stale_limit: ChronoDuration,
}

impl DataFeedProbe {
    pub fn new(market: Arc<dyn MarketData>, symbol: impl Into<String>, stale_limit: Duration) -> Self {
        Self {
            market,
            symbol: symbol.into(),
            stale_limit: ChronoDuration::from_std(stale_limit)
                .unwrap_or_else(|_| ChronoDuration::seconds(600)),
        }
    }
}

#[async_trait]
impl ComponentProbe for DataFeedProbe {
    fn name(&self) -> &str {
        DATA_FEED
    }

    async fn probe(&self) -> Result<SystemHealth, CoreError> {
        let last_bar = self.market.last_bar_time(&self.symbol).await?;
        let age = self.market.local_time().await - last_bar;
        if age > self.stale_limit {
            Ok(SystemHealth::Critical)
        } else {
            Ok(SystemHealth::Healthy)
        }
    }
}

/// Connectivity proxy: the local clock should track the server clock
pub struct ClockSyncProbe {
    market: Arc<dyn MarketData>,
    skew_limit: ChronoDuration,
}

impl ClockSyncProbe {
    pub fn new(market: Arc<dyn MarketData>, skew_limit: Duration) -> Self {
        Self {
            market,
            skew_limit: ChronoDuration::from_std(skew_limit)
                .unwrap_or_else(|_| ChronoDuration::seconds(300)),
        }
    }
}

#[async_trait]
impl ComponentProbe for ClockSyncProbe {
    fn name(&self) -> &str {
        NETWORK
    }

    async fn probe(&self) -> Result<SystemHealth, CoreError> {
        let server = self.market.server_time().await;
        let local = self.market.local_time().await;
        let skew = (server - local).abs();
        if skew > self.skew_limit {
            Ok(SystemHealth::Degraded)
        } else {
            Ok(SystemHealth::Healthy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::AccountSnapshot;
    use crate::host::MockHost;
    use chrono::Utc;

    #[tokio::test]
    async fn test_trading_engine_probe() {
        let host = Arc::new(MockHost::new());
        let probe = TradingEngineProbe::new(host.clone());
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Healthy);

        host.set_account_available(false).await;
        assert!(probe.probe().await.is_err());
    }

    #[tokio::test]
    async fn test_risk_engine_probe_margin_floor() {
        let host = Arc::new(MockHost::new());
        let probe = RiskEngineProbe::new(host.clone());
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Healthy);

        host.set_account(AccountSnapshot {
            equity: Decimal::new(10_000, 0),
            balance: Decimal::new(10_000, 0),
            free_margin: Decimal::new(500, 0), // 5% of equity
            margin_level: Decimal::new(120, 0),
        })
        .await;
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Critical);
    }

    #[tokio::test]
    async fn test_data_feed_probe_staleness() {
        let host = Arc::new(MockHost::new());
        let probe = DataFeedProbe::new(host.clone(), "EURUSD", Duration::from_secs(600));
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Healthy);

        host.set_last_bar_time(Utc::now() - ChronoDuration::minutes(11))
            .await;
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Critical);
    }

    #[tokio::test]
    async fn test_clock_sync_probe() {
        let host = Arc::new(MockHost::new());
        let probe = ClockSyncProbe::new(host.clone(), Duration::from_secs(300));
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Healthy);

        host.set_clock_skew(ChronoDuration::minutes(6)).await;
        assert_eq!(probe.probe().await.unwrap(), SystemHealth::Degraded);
    }
}
