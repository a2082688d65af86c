/// Classification for retry policy.
///
/// Used by the orchestrator to decide what to do after a provider call
/// fails.
///
/// | Class | Retry same provider? | Try next provider? |
/// |-------|----------------------|--------------------|
/// | `WithBackoff` | Yes, up to `max_retries` | Yes, once retries run out |
/// | `NextProvider` | No | Yes |
/// | `Never` | No | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Transient failure (timeout, 5xx, 429, transport error).
    /// Retry the same provider with exponential backoff.
    WithBackoff,

    /// This provider cannot serve the request (missing credential,
    /// authorization failure, unsupported pair, implausible rate) but another
    /// one might. Skip straight to the next provider without retrying.
    NextProvider,

    /// The request itself is invalid or the failure is terminal.
    Never,
}
