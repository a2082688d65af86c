//! Provider orchestration.
//!
//! The orchestrator manages the provider cascade, handling:
//! - Provider ordering by priority and pair support
//! - Retry with exponential backoff for transient failures
//! - Per-pair request throttling
//! - Rate validation
//! - Offline fallback when every provider fails

mod diagnostics;
mod orchestrator;
mod retry;
mod throttle;
mod validator;

pub use diagnostics::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use orchestrator::{OrchestratorConfig, ProviderOrchestrator, DEFAULT_CASCADE_TIMEOUT};
pub use retry::{
    retry_with_backoff, RetryOutcome, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_RETRIES,
};
pub use throttle::{RequestThrottle, ThrottleConfig};
pub use validator::{RateValidator, ValidatorConfig};
