use crate::core::events::{ErrorCategory, ErrorEvent, ErrorSeverity, RecoveryAction};
use crate::core::CoreError;
use crate::health::state::HealthState;
use log::{debug, error, warn};
use std::sync::Arc;

/// Infer the error category from the failure kind
///
/// Explicit reports carry their own category; this covers failures surfacing
/// as `CoreError` values, where only the kind is known.
pub fn classify_category(error: &CoreError) -> ErrorCategory {
    match error {
        CoreError::InvalidArgument(_) | CoreError::Validation(_) | CoreError::Config(_) => {
            ErrorCategory::Configuration
        }
        CoreError::Timeout(_) | CoreError::Connection(_) => ErrorCategory::Network,
        CoreError::Io(_) | CoreError::AccessDenied(_) | CoreError::OutOfMemory(_) => {
            ErrorCategory::System
        }
        CoreError::Arithmetic(_) => ErrorCategory::Data,
        CoreError::Host(_) => ErrorCategory::External,
        CoreError::Other(_) => ErrorCategory::System,
    }
}

/// Derive the severity for a classified failure
///
/// Out-of-memory class faults are absolute-critical. Risk errors are never
/// minor. Network errors are assumed transient.
pub fn classify_severity(category: ErrorCategory, error: Option<&CoreError>) -> ErrorSeverity {
    if let Some(CoreError::OutOfMemory(_)) = error {
        return ErrorSeverity::Critical;
    }
    match category {
        ErrorCategory::Risk => ErrorSeverity::High,
        ErrorCategory::Trading => ErrorSeverity::Medium,
        ErrorCategory::Network => ErrorSeverity::Low,
        _ => match error {
            Some(CoreError::InvalidArgument(_))
            | Some(CoreError::Validation(_))
            | Some(CoreError::Config(_)) => ErrorSeverity::Medium,
            _ => ErrorSeverity::Low,
        },
    }
}

/// Recovery action matrix; the single source of truth for error escalation
pub fn recommended_action(category: ErrorCategory, severity: ErrorSeverity) -> RecoveryAction {
    use ErrorCategory::*;
    use ErrorSeverity::*;
    use RecoveryAction as A;

    match (category, severity) {
        (_, Low) => A::None,
        (System, Medium) => A::None,
        (System, High) => A::Restart,
        (System, Critical) => A::Alert,
        (Trading, Medium) => A::Fallback,
        (Trading, High) | (Trading, Critical) => A::Stop,
        (Network, Medium) | (Network, High) => A::Retry,
        (Network, Critical) => A::Alert,
        (Data, Medium) | (Data, High) => A::Retry,
        (Data, Critical) => A::Restart,
        (Strategy, Medium) => A::Fallback,
        (Strategy, High) => A::Restart,
        (Strategy, Critical) => A::Alert,
        (Risk, Medium) | (Risk, High) | (Risk, Critical) => A::Stop,
        (Configuration, Medium) | (Configuration, High) | (Configuration, Critical) => A::Alert,
        (External, Medium) | (External, High) => A::Retry,
        (External, Critical) => A::Alert,
    }
}

/// Converts raw failures into classified, ledger-recorded error events
pub struct ErrorHandler {
    state: Arc<HealthState>,
}

impl ErrorHandler {
    pub fn new(state: Arc<HealthState>) -> Self {
        Self { state }
    }

    /// Classify and record a `CoreError`
    pub async fn handle_failure(&self, error: &CoreError, context: &str) -> RecoveryAction {
        let category = classify_category(error);
        let severity = classify_severity(category, Some(error));
        self.record(category, severity, error.to_string(), context)
            .await
    }

    /// Record an explicit report for categories the kind inference cannot see
    pub async fn handle_error(
        &self,
        category: ErrorCategory,
        message: impl Into<String>,
        context: &str,
    ) -> RecoveryAction {
        let severity = classify_severity(category, None);
        self.record(category, severity, message.into(), context)
            .await
    }

    /// Record a report with an explicit severity
    pub async fn report(
        &self,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: impl Into<String>,
        context: &str,
    ) -> RecoveryAction {
        self.record(category, severity, message.into(), context)
            .await
    }

    async fn record(
        &self,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: String,
        context: &str,
    ) -> RecoveryAction {
        let action = recommended_action(category, severity);
        let event = ErrorEvent::new(category, severity, message.clone(), context, action);

        // High and Critical are the alert surface; log with full context
        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => error!(
                "[{:?}/{:?}] {} (context: {}, action: {:?})",
                category, severity, message, context, action
            ),
            ErrorSeverity::Medium => warn!(
                "[{:?}/{:?}] {} (action: {:?})",
                category, severity, message, action
            ),
            ErrorSeverity::Low => debug!(
                "[{:?}/{:?}] {} (action: {:?})",
                category, severity, message, action
            ),
        }

        self.state.ledger().record(event).await;
        action
    }
}
