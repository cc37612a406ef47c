//! Area an error code belongs to

use super::codes::ErrorCode;
use serde::Serialize;

/// Picked from the thousands digit of the code
///
/// The server uses it to choose a log level for failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Order,
    Table,
    /// Notification queue and delivery
    Realtime,
    System,
}

impl From<u16> for ErrorCategory {
    fn from(code: u16) -> Self {
        match code / 1000 {
            4 => Self::Order,
            7 => Self::Table,
            8 => Self::Realtime,
            9 => Self::System,
            _ => Self::General,
        }
    }
}

impl ErrorCode {
    pub fn category(self) -> ErrorCategory {
        ErrorCategory::from(self.code())
    }
}
