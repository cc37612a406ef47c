//! Shared types for the order server
//!
//! Domain models, realtime notifications and the unified error system,
//! used by the server and by anything that talks to its API.

pub mod error;
pub mod models;
pub mod notification;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use notification::{Notification, NotificationType};
