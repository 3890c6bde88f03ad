//! Response classification and failure-policy decisions.
//!
//! Both functions here are pure: [`classify`] maps a status code and body
//! presence onto a [`ClassificationOutcome`], and [`decide`] maps that outcome
//! plus the caller's [`FailurePolicy`] onto a [`Decision`]. The orchestrator
//! does no flag checking of its own.
//!
//! | Outcome        | `allow_failed` | `fail_on_empty_response` | Decision       |
//! |----------------|----------------|--------------------------|----------------|
//! | `Success`      | any            | any                      | `Store`        |
//! | `EmptySuccess` | any            | true                     | `RejectEmpty`  |
//! | `EmptySuccess` | any            | false                    | `Store`        |
//! | `Failure`      | false          | any                      | `RejectStatus` |
//! | `Failure`      | true           | any                      | `Store`        |
//!
//! A tolerated failure is stored as-is even when its body is empty: the empty
//! check only ever applies to success-range statuses.

/// Whether a response body carries bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPresence {
    /// At least one body byte was observed.
    NonEmpty,
    /// The status implies no content, or the stream ended before any byte.
    Empty,
    /// Not inspected.
    Unknown,
}

/// Tagged result of inspecting one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationOutcome {
    /// Success-range status with a body (or one that must be read to know).
    Success,
    /// Success-range status with a definitively empty body.
    EmptySuccess,
    /// Any status outside the success range.
    Failure {
        /// The response status.
        status: u16,
    },
}

/// Caller tolerance flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Reject success-range responses that carry no body.
    pub fail_on_empty_response: bool,
    /// Store error-range responses instead of failing.
    pub allow_failed: bool,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            fail_on_empty_response: true,
            allow_failed: false,
        }
    }
}

/// What the orchestrator does with a classified response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Stream the body (possibly zero bytes) into storage.
    Store,
    /// Fail with [`DownloadError::EmptyResponse`](super::DownloadError::EmptyResponse).
    RejectEmpty,
    /// Fail with [`DownloadError::HttpStatus`](super::DownloadError::HttpStatus).
    RejectStatus,
}

/// Returns true for statuses in `[200, 300)`.
#[must_use]
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Classifies a response by status first, then body presence.
///
/// Body presence is ignored outside the success range.
#[must_use]
pub fn classify(status: u16, presence: BodyPresence) -> ClassificationOutcome {
    if !is_success_status(status) {
        return ClassificationOutcome::Failure { status };
    }
    match presence {
        BodyPresence::Empty => ClassificationOutcome::EmptySuccess,
        BodyPresence::NonEmpty | BodyPresence::Unknown => ClassificationOutcome::Success,
    }
}

/// Applies the failure policy to a classified response.
#[must_use]
pub fn decide(outcome: ClassificationOutcome, policy: FailurePolicy) -> Decision {
    match outcome {
        ClassificationOutcome::Success => Decision::Store,
        ClassificationOutcome::EmptySuccess if policy.fail_on_empty_response => {
            Decision::RejectEmpty
        }
        ClassificationOutcome::EmptySuccess => Decision::Store,
        ClassificationOutcome::Failure { .. } if policy.allow_failed => Decision::Store,
        ClassificationOutcome::Failure { .. } => Decision::RejectStatus,
    }
}
