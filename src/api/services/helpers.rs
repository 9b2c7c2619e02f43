//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::errors::PresenceError;
use crate::storage::{BackendKind, Served};

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
    storage: Option<BackendKind>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
            storage,
        })
}

/// 构建成功响应，附带处理请求的后端
pub fn served_response<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    served: Served<T>,
) -> HttpResponse {
    json_response(
        status,
        ErrorCode::Success,
        message,
        Some(served.data),
        Some(served.backend),
    )
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None, None)
}

/// 从 PresenceError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 服务端错误只返回通用信息，详情写入日志。
pub fn error_from_presence(err: &PresenceError) -> HttpResponse {
    let status = err.http_status();
    let error_code = ErrorCode::from(err);

    if err.is_client_error() {
        return error_response(status, error_code, err.message());
    }

    error!("Request failed: {} ({})", err, err.code());
    let message = match err {
        PresenceError::StoreUnavailable(_) => "Storage temporarily unavailable",
        _ => "Internal server error",
    };
    error_response(status, error_code, message)
}

/// 统一 Result → HttpResponse 转换
pub fn served_result<T: Serialize>(
    result: Result<Served<T>, PresenceError>,
    status: StatusCode,
    message: &str,
) -> HttpResponse {
    match result {
        Ok(served) => served_response(status, message, served),
        Err(e) => error_from_presence(&e),
    }
}
