//! Errors shared by the server and its clients
//!
//! An [`AppError`] carries an [`ErrorCode`], a message and optional details.
//! Handlers return it directly; on the wire it becomes an [`ApiResponse`]
//! with the HTTP status of its code.
//!
//! | Range | Area |
//! |-------|------|
//! | 0xxx | general / persistence |
//! | 4xxx | orders |
//! | 7xxx | tables |
//! | 8xxx | notification queue and delivery |
//! | 9xxx | system |
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::client_mismatch(12, 8);
//! assert_eq!(err.code, ErrorCode::OrderClientMismatch);
//!
//! let body: ApiResponse<()> = err.into();
//! assert_eq!(body.code, 4008);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
