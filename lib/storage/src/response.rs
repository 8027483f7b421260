use cosmap_core::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why an operation failed, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub status_code: u16,
    pub message: String,
}

impl ErrorInfo {
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const INTERNAL: u16 = 500;

    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

impl From<&Error> for ErrorInfo {
    fn from(e: &Error) -> Self {
        let status_code = match e {
            Error::Serialization(_) => Self::INTERNAL,
            _ => Self::BAD_REQUEST,
        };
        Self::new(status_code, e.to_string())
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code)
    }
}

/// Outcome of one remote operation. Failures are values, not errors, so a
/// bulk call can carry them alongside successes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosResponse<T = serde_json::Value> {
    pub is_successful: bool,
    pub result: Option<T>,
    pub request_charge: f64,
    pub execution_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> CosmosResponse<T> {
    #[must_use]
    pub fn success(result: T) -> Self {
        Self {
            is_successful: true,
            result: Some(result),
            request_charge: 0.0,
            execution_time: Duration::ZERO,
            continuation_token: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            is_successful: false,
            result: None,
            request_charge: 0.0,
            execution_time: Duration::ZERO,
            continuation_token: None,
            error: Some(error),
        }
    }

    /// Failed response for a local mapping error.
    #[must_use]
    pub fn from_error(e: &Error) -> Self {
        Self::failure(ErrorInfo::from(e))
    }

    #[must_use]
    pub fn with_request_charge(mut self, request_charge: f64) -> Self {
        self.request_charge = request_charge;
        self
    }

    #[must_use]
    pub fn with_execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = execution_time;
        self
    }

    #[must_use]
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }

    /// Transform the result while keeping status, charge and timing.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CosmosResponse<U> {
        CosmosResponse {
            is_successful: self.is_successful,
            result: self.result.map(f),
            request_charge: self.request_charge,
            execution_time: self.execution_time,
            continuation_token: self.continuation_token,
            error: self.error,
        }
    }

    /// Like [`map`](Self::map), but a failing conversion turns the response
    /// into a failure.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> cosmap_core::Result<U>) -> CosmosResponse<U> {
        let CosmosResponse {
            is_successful,
            result,
            request_charge,
            execution_time,
            continuation_token,
            error,
        } = self;

        let (is_successful, result, error) = match result.map(f).transpose() {
            Ok(result) => (is_successful, result, error),
            Err(e) => (false, None, Some(ErrorInfo::from(&e))),
        };

        CosmosResponse {
            is_successful,
            result,
            request_charge,
            execution_time,
            continuation_token,
            error,
        }
    }
}

/// Sum of request charges over a batch of responses.
pub fn total_request_charge<T>(responses: &[CosmosResponse<T>]) -> f64 {
    responses.iter().map(|r| r.request_charge).sum()
}

/// Sum of per-operation execution times.
pub fn total_execution_time<T>(responses: &[CosmosResponse<T>]) -> Duration {
    responses.iter().map(|r| r.execution_time).sum()
}

pub fn all_successful<T>(responses: &[CosmosResponse<T>]) -> bool {
    responses.iter().all(|r| r.is_successful)
}
