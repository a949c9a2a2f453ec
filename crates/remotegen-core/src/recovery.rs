// ── Error recovery policy ──
//
// Classifies a per-device failure onto a closed taxonomy and decides what
// the orchestrator does next. Retry counts live in a `RetryLedger` that is
// created per run and threaded through explicitly; nothing here is global.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Closed failure taxonomy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    ApiConnection,
    ApiValidation,
    DeviceClassUnsupported,
    GenerationFailure,
    FileWriteError,
    TemplateError,
    ValidationError,
}

/// Keyword table, checked in order. Anything unmatched is a
/// `GenerationFailure`.
const KEYWORDS: &[(ErrorType, &[&str])] = &[
    (
        ErrorType::ApiConnection,
        &[
            "connection",
            "network",
            "timed out",
            "timeout",
            "unreachable",
            "refused",
            "econn",
        ],
    ),
    (
        ErrorType::DeviceClassUnsupported,
        &["unsupported", "not supported", "unknown device class"],
    ),
    (ErrorType::TemplateError, &["template", "generation", "render"]),
    (
        ErrorType::FileWriteError,
        &["write", "permission", "eacces", "read-only", "no space"],
    ),
    (
        ErrorType::ApiValidation,
        &["invalid configuration", "malformed", "not found", "rejected"],
    ),
    (ErrorType::ValidationError, &["validation", "type error"]),
];

impl ErrorType {
    /// Keyword classification of an opaque message.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| message.contains(w)))
            .map_or(Self::GenerationFailure, |(kind, _)| *kind)
    }

    /// Typed classification; opaque variants fall back to keywords.
    pub fn of(err: &CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { .. }
            | CoreError::Timeout { .. }
            | CoreError::Unauthorized { .. } => Self::ApiConnection,
            CoreError::DeviceNotFound { .. }
            | CoreError::InvalidDeviceConfig { .. }
            | CoreError::Api { .. }
            | CoreError::Config { .. } => Self::ApiValidation,
            CoreError::UnsupportedDeviceClass { .. } => Self::DeviceClassUnsupported,
            CoreError::Template { .. } => Self::TemplateError,
            CoreError::FileWrite { .. } => Self::FileWriteError,
            CoreError::Validation { .. } => Self::ValidationError,
            CoreError::Schema { .. } => Self::GenerationFailure,
            CoreError::Internal(message) => Self::classify(message),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecoveryAction {
    Retry,
    Skip,
    Abort,
    Continue,
}

/// Recovery directive for one failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResult {
    /// `false` only when the run must stop.
    pub success: bool,
    pub action: RecoveryAction,
    pub message: String,
    pub retry_after: Option<Duration>,
    pub manual_steps: Option<Vec<String>>,
}

/// Where a failure happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    pub device_id: Option<String>,
    pub device_class: Option<String>,
    pub operation: String,
    pub timestamp: DateTime<Utc>,
    pub additional_info: Option<serde_json::Value>,
}

impl ErrorContext {
    pub fn for_device(device_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            device_class: None,
            operation: operation.into(),
            timestamp: Utc::now(),
            additional_info: None,
        }
    }
}

/// One entry of the run's handled-error history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandledError {
    pub device_id: Option<String>,
    pub error_type: ErrorType,
    pub action: RecoveryAction,
    pub attempt: u32,
    pub message: String,
}

/// Run-scoped retry counters keyed by `(device, error type)`, plus the
/// history of every handled error.
#[derive(Debug, Default)]
pub struct RetryLedger {
    attempts: HashMap<(String, ErrorType), u32>,
    history: Vec<HandledError>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self, device_id: &str, error_type: ErrorType) -> u32 {
        self.attempts
            .get(&(device_id.to_owned(), error_type))
            .copied()
            .unwrap_or(0)
    }

    fn bump(&mut self, device_id: &str, error_type: ErrorType) -> u32 {
        let count = self
            .attempts
            .entry((device_id.to_owned(), error_type))
            .or_insert(0);
        *count += 1;
        *count
    }

    pub fn history(&self) -> &[HandledError] {
        &self.history
    }

    pub fn into_history(self) -> Vec<HandledError> {
        self.history
    }
}

/// Retry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_backoff: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RecoveryPolicy {
    /// `2^attempt * base_delay`, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

/// Maps failures to recovery directives.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    policy: RecoveryPolicy,
}

impl ErrorHandler {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Decide what to do about `err`, recording the decision in `ledger`.
    pub fn handle(
        &self,
        ledger: &mut RetryLedger,
        err: &CoreError,
        context: &ErrorContext,
    ) -> RecoveryResult {
        let error_type = ErrorType::of(err);
        let device = context.device_id.as_deref().unwrap_or("<run>");
        let attempt = ledger.attempts(device, error_type);
        let message = err.to_string();
        // Rejected credentials fail the same way on every attempt.
        let retryable = !matches!(err, CoreError::Unauthorized { .. });

        let result = match error_type {
            ErrorType::ApiConnection | ErrorType::GenerationFailure
                if retryable && attempt < self.policy.max_retries =>
            {
                let delay = self.policy.backoff(attempt);
                ledger.bump(device, error_type);
                RecoveryResult {
                    success: true,
                    action: RecoveryAction::Retry,
                    message: format!(
                        "{} failed ({error_type}), retry {} of {} in {}ms",
                        context.operation,
                        attempt + 1,
                        self.policy.max_retries,
                        delay.as_millis()
                    ),
                    retry_after: Some(delay),
                    manual_steps: None,
                }
            }
            ErrorType::ApiConnection => RecoveryResult {
                success: false,
                action: RecoveryAction::Abort,
                message: if retryable {
                    format!("configuration source unreachable after {attempt} retries: {message}")
                } else {
                    message
                },
                retry_after: None,
                manual_steps: Some(vec![
                    "Check that the configuration service is running and reachable".into(),
                    "Verify the source URL and token".into(),
                ]),
            },
            ErrorType::GenerationFailure => skip(format!(
                "giving up after {attempt} retries: {message}"
            )),
            ErrorType::DeviceClassUnsupported => RecoveryResult {
                manual_steps: Some(vec![
                    "Add a family for this device class or register it as an alias".into(),
                ]),
                ..skip(message)
            },
            ErrorType::TemplateError | ErrorType::ApiValidation => skip(message),
            ErrorType::FileWriteError => RecoveryResult {
                success: false,
                action: RecoveryAction::Abort,
                message,
                retry_after: None,
                manual_steps: Some(vec![
                    "Check permissions and free space in the output directory".into(),
                ]),
            },
            ErrorType::ValidationError => RecoveryResult {
                success: true,
                action: RecoveryAction::Continue,
                message,
                retry_after: None,
                manual_steps: None,
            },
        };

        match result.action {
            RecoveryAction::Retry => debug!(
                device_id = %device,
                %error_type,
                attempt = attempt + 1,
                delay_ms = result
                    .retry_after
                    .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                "scheduling retry"
            ),
            action => warn!(device_id = %device, %error_type, %action, "{}", result.message),
        }

        ledger.history.push(HandledError {
            device_id: context.device_id.clone(),
            error_type,
            action: result.action,
            attempt,
            message: result.message.clone(),
        });
        result
    }
}

fn skip(message: String) -> RecoveryResult {
    RecoveryResult {
        success: true,
        action: RecoveryAction::Skip,
        message,
        retry_after: None,
        manual_steps: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx() -> ErrorContext {
        ErrorContext::for_device("tv", "generate")
    }

    fn connection() -> CoreError {
        CoreError::ConnectionFailed {
            source_name: "svc".into(),
            reason: "refused".into(),
        }
    }

    #[test]
    fn keyword_classification() {
        assert_eq!(ErrorType::classify("Network unreachable"), ErrorType::ApiConnection);
        assert_eq!(
            ErrorType::classify("device class foo is unsupported"),
            ErrorType::DeviceClassUnsupported
        );
        assert_eq!(ErrorType::classify("template blew up"), ErrorType::TemplateError);
        assert_eq!(ErrorType::classify("permission denied"), ErrorType::FileWriteError);
        assert_eq!(ErrorType::classify("something odd"), ErrorType::GenerationFailure);
    }

    #[test]
    fn typed_classification() {
        assert_eq!(ErrorType::of(&connection()), ErrorType::ApiConnection);
        assert_eq!(
            ErrorType::of(&CoreError::UnsupportedDeviceClass {
                device_class: "toaster".into()
            }),
            ErrorType::DeviceClassUnsupported
        );
        assert_eq!(
            ErrorType::of(&CoreError::Internal("disk write failed".into())),
            ErrorType::FileWriteError
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RecoveryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff(10), Duration::from_secs(30));
        assert_eq!(policy.backoff(40), Duration::from_secs(30));
    }

    #[test]
    fn connection_retries_then_aborts() {
        let handler = ErrorHandler::default();
        let mut ledger = RetryLedger::new();
        let actions: Vec<_> = (0..4)
            .map(|_| handler.handle(&mut ledger, &connection(), &ctx()).action)
            .collect();
        assert_eq!(
            actions,
            vec![
                RecoveryAction::Retry,
                RecoveryAction::Retry,
                RecoveryAction::Retry,
                RecoveryAction::Abort
            ]
        );
        assert_eq!(ledger.history().len(), 4);
    }

    #[test]
    fn rejected_credentials_abort_without_retry() {
        let handler = ErrorHandler::default();
        let mut ledger = RetryLedger::new();
        let err = CoreError::Unauthorized {
            source_name: "svc".into(),
        };
        let result = handler.handle(&mut ledger, &err, &ctx());
        assert_eq!(result.action, RecoveryAction::Abort);
        assert!(!result.success);
        assert!(result.retry_after.is_none());
        assert_eq!(ledger.attempts("tv", ErrorType::ApiConnection), 0);
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn generic_failure_retries_then_skips() {
        let handler = ErrorHandler::new(RecoveryPolicy {
            max_retries: 1,
            ..RecoveryPolicy::default()
        });
        let mut ledger = RetryLedger::new();
        let err = CoreError::Internal("mystery".into());
        assert_eq!(handler.handle(&mut ledger, &err, &ctx()).action, RecoveryAction::Retry);
        assert_eq!(handler.handle(&mut ledger, &err, &ctx()).action, RecoveryAction::Skip);
    }

    #[test]
    fn counters_are_per_device_and_type() {
        let handler = ErrorHandler::new(RecoveryPolicy {
            max_retries: 1,
            ..RecoveryPolicy::default()
        });
        let mut ledger = RetryLedger::new();
        handler.handle(&mut ledger, &connection(), &ctx());
        let other = ErrorContext::for_device("amp", "generate");
        assert_eq!(
            handler.handle(&mut ledger, &connection(), &other).action,
            RecoveryAction::Retry
        );
        assert_eq!(ledger.attempts("tv", ErrorType::ApiConnection), 1);
        assert_eq!(ledger.attempts("tv", ErrorType::GenerationFailure), 0);
    }

    #[test]
    fn immediate_directives() {
        let handler = ErrorHandler::default();
        let mut ledger = RetryLedger::new();
        let unsupported = CoreError::UnsupportedDeviceClass {
            device_class: "toaster".into(),
        };
        assert_eq!(
            handler.handle(&mut ledger, &unsupported, &ctx()).action,
            RecoveryAction::Skip
        );
        let template = CoreError::Template {
            message: "bad".into(),
        };
        assert_eq!(
            handler.handle(&mut ledger, &template, &ctx()).action,
            RecoveryAction::Skip
        );
        let write = CoreError::FileWrite {
            path: PathBuf::from("/ro/x.tsx"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let result = handler.handle(&mut ledger, &write, &ctx());
        assert_eq!(result.action, RecoveryAction::Abort);
        assert!(!result.success);
        let validation = CoreError::Validation {
            message: "TS2304".into(),
        };
        assert_eq!(
            handler.handle(&mut ledger, &validation, &ctx()).action,
            RecoveryAction::Continue
        );
    }
}
