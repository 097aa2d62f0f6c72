use crate::core::events::{
    ErrorCategory, PositionHandle, RiskDecision, SystemHealth, SystemMode, TradeDirection,
    TradeOrder,
};
use crate::health::{ErrorHandler, HealthState};
use crate::host::{MarketData, OrderGateway};
use crate::risk::RiskEngine;
use log::{info, warn};
use std::sync::Arc;

/// Result of one entry attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Order accepted by the host
    Submitted(PositionHandle),
    /// Rejected before submission; carries the reason
    Rejected(String),
}

impl ExecutionOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ExecutionOutcome::Submitted(_))
    }
}

/// Consults risk and health state before any order reaches the host, and
/// reports submission outcomes back into the health ledger
pub struct ExecutionCoordinator {
    risk: Arc<RiskEngine>,
    market: Arc<dyn MarketData>,
    gateway: Arc<dyn OrderGateway>,
    state: Arc<HealthState>,
    handler: Arc<ErrorHandler>,
}

impl ExecutionCoordinator {
    pub fn new(
        risk: Arc<RiskEngine>,
        market: Arc<dyn MarketData>,
        gateway: Arc<dyn OrderGateway>,
        state: Arc<HealthState>,
        handler: Arc<ErrorHandler>,
    ) -> Self {
        Self {
            risk,
            market,
            gateway,
            state,
            handler,
        }
    }

    /// Attempt a market entry for one symbol and direction
    pub async fn execute_entry(&self, symbol: &str, direction: TradeDirection) -> ExecutionOutcome {
        // Health gate first: no risk evaluation while the system is unfit
        if self.state.mode().await == SystemMode::Emergency {
            let reason = "emergency mode active, trading halted".to_string();
            warn!("entry for {} blocked: {}", symbol, reason);
            return ExecutionOutcome::Rejected(reason);
        }
        let health = self.state.system_health().await;
        if health >= SystemHealth::Critical {
            let reason = format!("system health {:?} blocks trading", health);
            warn!("entry for {} blocked: {}", symbol, reason);
            return ExecutionOutcome::Rejected(reason);
        }

        let instrument = match self.market.instrument(symbol).await {
            Ok(instrument) => instrument,
            Err(error) => {
                self.handler
                    .handle_failure(&error, &format!("instrument lookup for {}", symbol))
                    .await;
                return ExecutionOutcome::Rejected(error.to_string());
            }
        };

        let decision = self.risk.run(&instrument, direction).await;
        if !decision.is_valid {
            let reason = decision
                .rejection_reason
                .unwrap_or_else(|| "risk validation failed".to_string());
            return ExecutionOutcome::Rejected(reason);
        }

        self.submit(symbol, direction, &decision).await
    }

    async fn submit(
        &self,
        symbol: &str,
        direction: TradeDirection,
        decision: &RiskDecision,
    ) -> ExecutionOutcome {
        let order = TradeOrder::from_decision(symbol, direction, decision);
        match self.gateway.submit(&order).await {
            Ok(handle) => {
                info!(
                    "order {} submitted: {} {:?} {} lots (sl {} / tp {} pips) -> position {}",
                    order.client_order_id,
                    symbol,
                    direction,
                    order.volume,
                    order.stop_loss_pips,
                    order.take_profit_pips,
                    handle.position_id
                );
                ExecutionOutcome::Submitted(handle)
            }
            Err(error) => {
                self.handler
                    .handle_error(
                        ErrorCategory::Trading,
                        error.to_string(),
                        &format!("order submission for {}", symbol),
                    )
                    .await;
                ExecutionOutcome::Rejected(error.to_string())
            }
        }
    }
}
