//! HTTP status for each error code

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(self) -> StatusCode {
        use ErrorCode::*;

        match self {
            Success => StatusCode::OK,
            ValidationFailed | RequiredField => StatusCode::BAD_REQUEST,
            OrderClientMismatch | TableClientMismatch => StatusCode::FORBIDDEN,
            NotFound | OrderNotFound | OrderItemNotFound | TableNotFound => StatusCode::NOT_FOUND,
            // retryable once the dispatcher catches up
            EventQueueFull | EventQueueOverloaded | EventBusClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            InsertFailed | UpdateFailed | SerializationFailed | InternalError | DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
