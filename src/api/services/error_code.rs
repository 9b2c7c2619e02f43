//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use crate::errors::PresenceError;
use crate::storage::models::TS_EXPORT_PATH;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 记录错误
/// - 6000-6099: 存储错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    InternalServerError = 1005,

    // 记录错误 3000-3099
    EntryNotFound = 3000,
    EntryOutOfRange = 3001,
    EntryFutureDate = 3002,

    // 存储错误 6000-6099
    StorageUnavailable = 6000,
    StorageError = 6001,
}

impl From<&PresenceError> for ErrorCode {
    fn from(err: &PresenceError) -> Self {
        match err {
            PresenceError::InvalidInput(_) => ErrorCode::BadRequest,
            PresenceError::OutOfRange(_) => ErrorCode::EntryOutOfRange,
            PresenceError::FutureDate(_) => ErrorCode::EntryFutureDate,
            PresenceError::NotFound(_) => ErrorCode::EntryNotFound,
            PresenceError::StoreUnavailable(_) => ErrorCode::StorageUnavailable,
            PresenceError::DatabaseConfig(_)
            | PresenceError::DatabaseConnection(_)
            | PresenceError::DatabaseOperation(_) => ErrorCode::StorageError,
            PresenceError::Internal(_) | PresenceError::FileOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::EntryFutureDate).unwrap(),
            "3002"
        );
    }

    #[test]
    fn test_from_presence_error() {
        assert_eq!(
            ErrorCode::from(&PresenceError::out_of_range("x")),
            ErrorCode::EntryOutOfRange
        );
        assert_eq!(
            ErrorCode::from(&PresenceError::store_unavailable("x")),
            ErrorCode::StorageUnavailable
        );
        assert_eq!(
            ErrorCode::from(&PresenceError::database_operation("x")),
            ErrorCode::StorageError
        );
    }
}
