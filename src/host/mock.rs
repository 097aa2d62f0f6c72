use crate::core::events::{
    AccountSnapshot, Bar, Instrument, PositionHandle, Timeframe, TradeOrder,
};
use crate::core::CoreError;
use crate::host::{AccountSource, MarketData, OrderGateway};
use crate::types::{Lots, Price};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory host platform for tests and dry runs
///
/// Every observable input can be set explicitly so edge cases (stale feeds,
/// unreadable accounts, rejected submissions) are reproducible.
pub struct MockHost {
    instrument: RwLock<Instrument>,
    account: RwLock<AccountSnapshot>,
    account_available: RwLock<bool>,
    bars: RwLock<HashMap<Timeframe, Vec<Bar>>>,
    last_bar_time: RwLock<DateTime<Utc>>,
    clock_skew: RwLock<ChronoDuration>,
    reject_submissions: RwLock<bool>,
    submitted: RwLock<Vec<TradeOrder>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            instrument: RwLock::new(Self::default_instrument()),
            account: RwLock::new(AccountSnapshot {
                equity: Decimal::new(10_000, 0),
                balance: Decimal::new(10_000, 0),
                free_margin: Decimal::new(9_500, 0),
                margin_level: Decimal::new(1_000, 0),
            }),
            account_available: RwLock::new(true),
            bars: RwLock::new(HashMap::new()),
            last_bar_time: RwLock::new(Utc::now()),
            clock_skew: RwLock::new(ChronoDuration::zero()),
            reject_submissions: RwLock::new(false),
            submitted: RwLock::new(Vec::new()),
        }
    }

    fn default_instrument() -> Instrument {
        Instrument {
            symbol: "EURUSD".to_string(),
            pip_size: Decimal::new(1, 4),
            digits: 5,
            spread: Decimal::new(1, 4), // 1.0 pips
            volume_min: Lots(Decimal::new(1, 2)),
            volume_max: Lots(Decimal::new(100, 0)),
            volume_step: Lots(Decimal::new(1, 2)),
            pip_value: Decimal::TEN,
        }
    }

    pub async fn set_instrument(&self, instrument: Instrument) {
        *self.instrument.write().await = instrument;
    }

    pub async fn set_spread(&self, spread: Decimal) {
        self.instrument.write().await.spread = spread;
    }

    pub async fn set_account(&self, account: AccountSnapshot) {
        *self.account.write().await = account;
    }

    /// Make account reads fail, as a crashed trading engine would
    pub async fn set_account_available(&self, available: bool) {
        *self.account_available.write().await = available;
    }

    pub async fn set_bars(&self, timeframe: Timeframe, bars: Vec<Bar>) {
        self.bars.write().await.insert(timeframe, bars);
    }

    pub async fn set_last_bar_time(&self, time: DateTime<Utc>) {
        *self.last_bar_time.write().await = time;
    }

    pub async fn set_clock_skew(&self, skew: ChronoDuration) {
        *self.clock_skew.write().await = skew;
    }

    pub async fn set_reject_submissions(&self, reject: bool) {
        *self.reject_submissions.write().await = reject;
    }

    pub async fn submitted_orders(&self) -> Vec<TradeOrder> {
        self.submitted.read().await.clone()
    }

    /// Build a flat bar series whose true range per bar is `range` price units
    pub fn flat_bars(count: usize, base: Decimal, range: Decimal) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(count);
        let start = Utc::now() - ChronoDuration::minutes(count as i64);
        for i in 0..count {
            bars.push(Bar {
                time: start + ChronoDuration::minutes(i as i64),
                open: Price::new(base),
                high: Price::new(base + range),
                low: Price::new(base),
                close: Price::new(base),
            });
        }
        bars
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for MockHost {
    async fn instrument(&self, symbol: &str) -> Result<Instrument, CoreError> {
        let instrument = self.instrument.read().await;
        if instrument.symbol != symbol {
            return Err(CoreError::Host(format!("unknown symbol {}", symbol)));
        }
        Ok(instrument.clone())
    }

    async fn bars(
        &self,
        _symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, CoreError> {
        let bars = self.bars.read().await;
        let series = bars
            .get(&timeframe)
            .ok_or_else(|| CoreError::Host(format!("no bars for {:?}", timeframe)))?;
        if series.len() < count {
            return Err(CoreError::Host(format!(
                "only {} of {} bars available",
                series.len(),
                count
            )));
        }
        Ok(series[series.len() - count..].to_vec())
    }

    async fn last_bar_time(&self, _symbol: &str) -> Result<DateTime<Utc>, CoreError> {
        Ok(*self.last_bar_time.read().await)
    }

    async fn server_time(&self) -> DateTime<Utc> {
        Utc::now() + *self.clock_skew.read().await
    }

    async fn local_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
impl AccountSource for MockHost {
    async fn snapshot(&self) -> Result<AccountSnapshot, CoreError> {
        if !*self.account_available.read().await {
            return Err(CoreError::Host("account data unavailable".to_string()));
        }
        Ok(self.account.read().await.clone())
    }
}

#[async_trait]
impl OrderGateway for MockHost {
    async fn submit(&self, order: &TradeOrder) -> Result<PositionHandle, CoreError> {
        if *self.reject_submissions.read().await {
            return Err(CoreError::Host("order rejected by broker".to_string()));
        }
        self.submitted.write().await.push(order.clone());
        Ok(PositionHandle {
            position_id: order.client_order_id.to_string(),
            symbol: order.symbol.clone(),
            direction: order.direction,
            volume: order.volume,
            entry_price: Price::from_str("1.1000").unwrap_or(Price::ZERO),
        })
    }
}
