//! Numeric error codes
//!
//! Codes travel as plain integers in every error body. The thousands digit
//! names the area the failure belongs to, see [`super::ErrorCategory`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    ValidationFailed = 2,
    /// Generic lookup miss, used when the caller did not name a resource code
    NotFound = 3,
    RequiredField = 7,
    InsertFailed = 10,
    UpdateFailed = 11,

    OrderNotFound = 4001,
    OrderItemNotFound = 4006,
    /// Items added through a client id that does not own the order
    OrderClientMismatch = 4008,

    TableNotFound = 7001,
    /// Order placed on a table that belongs to another client
    TableClientMismatch = 7002,

    /// A notification could not be rendered as JSON
    SerializationFailed = 8001,
    EventQueueFull = 8002,
    /// Every publish slot is taken by a task still waiting for the queue
    EventQueueOverloaded = 8003,
    EventBusClosed = 8004,

    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Every code, in numeric order
    pub const ALL: [ErrorCode; 17] = [
        Self::Success,
        Self::ValidationFailed,
        Self::NotFound,
        Self::RequiredField,
        Self::InsertFailed,
        Self::UpdateFailed,
        Self::OrderNotFound,
        Self::OrderItemNotFound,
        Self::OrderClientMismatch,
        Self::TableNotFound,
        Self::TableClientMismatch,
        Self::SerializationFailed,
        Self::EventQueueFull,
        Self::EventQueueOverloaded,
        Self::EventBusClosed,
        Self::InternalError,
        Self::DatabaseError,
    ];

    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Message used when an error is raised without one of its own
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::RequiredField => "Required field is missing",
            Self::InsertFailed => "Record could not be inserted",
            Self::UpdateFailed => "Record could not be updated",
            Self::OrderNotFound => "Order not found",
            Self::OrderItemNotFound => "Order item not found",
            Self::OrderClientMismatch => "Order belongs to a different client",
            Self::TableNotFound => "Table not found",
            Self::TableClientMismatch => "Table belongs to a different client",
            Self::SerializationFailed => "Notification could not be serialized",
            Self::EventQueueFull => "Event queue is full",
            Self::EventQueueOverloaded => "Too many pending notifications",
            Self::EventBusClosed => "Event bus is closed",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

/// A number that is not one of [`ErrorCode::ALL`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown error code {0}")]
pub struct InvalidErrorCode(pub u16);

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.code(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(ErrorCode::RequiredField.code(), 7);
        assert_eq!(ErrorCode::OrderClientMismatch.code(), 4008);
        assert_eq!(ErrorCode::TableNotFound.code(), 7001);
        assert_eq!(ErrorCode::EventQueueOverloaded.code(), 8003);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_all_is_sorted_and_complete() {
        let values: Vec<u16> = ErrorCode::ALL.iter().map(|c| c.code()).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(values, sorted);

        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        assert_eq!(ErrorCode::try_from(4), Err(InvalidErrorCode(4)));
        assert_eq!(InvalidErrorCode(6001).to_string(), "unknown error code 6001");

        let parsed: Result<ErrorCode, _> = serde_json::from_str("12345");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::OrderNotFound).unwrap(), "4001");
        let code: ErrorCode = serde_json::from_str("8002").unwrap();
        assert_eq!(code, ErrorCode::EventQueueFull);
        assert_eq!(code.to_string(), "8002");
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(ErrorCode::ALL[1..].iter().all(|c| !c.is_success()));
    }
}
