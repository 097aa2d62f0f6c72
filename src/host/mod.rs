pub mod mock;

use crate::core::events::{AccountSnapshot, Bar, Instrument, PositionHandle, Timeframe, TradeOrder};
use crate::core::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

pub use mock::MockHost;

/// Market data supplied by the host platform
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Current instrument metadata
    async fn instrument(&self, symbol: &str) -> Result<Instrument, CoreError>;

    /// Most recent `count` bars, oldest first
    async fn bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, CoreError>;

    /// Open time of the newest bar on the trading timeframe
    async fn last_bar_time(&self, symbol: &str) -> Result<DateTime<Utc>, CoreError>;

    /// Host server clock
    async fn server_time(&self) -> DateTime<Utc>;

    /// Local wall clock
    async fn local_time(&self) -> DateTime<Utc>;
}

/// Live account state supplied by the host platform
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Fresh snapshot; callers must not cache it across decisions
    async fn snapshot(&self) -> Result<AccountSnapshot, CoreError>;
}

/// Order submission primitive supplied by the host platform
#[automock]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit(&self, order: &TradeOrder) -> Result<PositionHandle, CoreError>;
}
