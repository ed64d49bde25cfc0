use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification of every failure the onboarding client can observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum ErrorCode {
    /// Transport failure or an unexpected HTTP status.
    Network,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server rejected the bearer token; credentials have been cleared.
    Unauthorized,
    /// The session is unknown to the server or has expired.
    SessionExpired,
    /// The server rejected the payload.
    InvalidInput,
    /// The server (or a storage backend) is temporarily unavailable.
    Unavailable,
    /// Another network-calling operation is already in flight.
    Busy,
    /// The operation requires an active session and none is loaded.
    NoSession,
    /// Reading or writing the durable local store failed.
    Storage,
    /// Encoding/decoding or other internal failure.
    Internal,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Network => "network",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::SessionExpired => "session_expired",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::Busy => "busy",
            ErrorCode::NoSession => "no_session",
            ErrorCode::Storage => "storage",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error value surfaced by every fallible operation and recorded in
/// [`OnboardingState::error`](crate::state::OnboardingState::error).
///
/// It is `Clone` so the same value can be returned to the caller and kept in
/// state for display.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct OnboardingError {
    pub code: ErrorCode,
    pub message: String,
    /// HTTP status when the error came from a server response.
    pub status: Option<u16>,
}

impl OnboardingError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// True when a resume attempt should give up on the stored session.
    pub fn is_session_expired(&self) -> bool {
        self.code == ErrorCode::SessionExpired
    }
}

pub type OnboardingResult<T> = Result<T, OnboardingError>;

pub(crate) fn serde_error(err: serde_json::Error) -> OnboardingError {
    OnboardingError::new(ErrorCode::Internal, err.to_string())
}

pub(crate) fn storage_error(err: std::io::Error) -> OnboardingError {
    OnboardingError::new(ErrorCode::Storage, err.to_string())
}

#[cfg(feature = "redis")]
pub(crate) fn redis_error(err: redis::RedisError) -> OnboardingError {
    OnboardingError::new(ErrorCode::Unavailable, err.to_string())
}

pub(crate) fn invalid_argument(message: impl Into<String>) -> OnboardingError {
    OnboardingError::new(ErrorCode::InvalidInput, message).with_status(422)
}

pub(crate) fn not_found(session: &crate::model::SessionId) -> OnboardingError {
    OnboardingError::new(
        ErrorCode::SessionExpired,
        format!("onboarding session {session} not found or expired"),
    )
    .with_status(404)
}

pub(crate) fn no_session() -> OnboardingError {
    OnboardingError::new(ErrorCode::NoSession, "no active onboarding session")
}

pub(crate) fn busy() -> OnboardingError {
    OnboardingError::new(
        ErrorCode::Busy,
        "another onboarding request is already in flight",
    )
}
