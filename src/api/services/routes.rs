//! API 路由配置

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, error, web};
use tracing::warn;

use super::entries::{
    delete_entry, get_all_entries, get_daily_summary, get_entries_by_date, get_entries_by_range,
    get_hourly_breakdown, get_overview, post_entry,
};
use super::error_code::ErrorCode;
use super::health::HealthService;
use super::helpers::error_response;

/// 记录路由 `{api_prefix}`
///
/// 包含：
/// - POST/DELETE /entry - 写入 / 删除记录
/// - GET /entries-by-date, /entries-by-range - 查询记录
/// - GET /daily-summary, /hourly-breakdown, /overview - 聚合
/// - GET /all - 全部记录
pub fn entry_routes(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .app_data(json_config())
        .app_data(query_config())
        .route("/entry", web::post().to(post_entry))
        .route("/entry", web::delete().to(delete_entry))
        .route("/entries-by-date", web::get().to(get_entries_by_date))
        .route("/entries-by-range", web::get().to(get_entries_by_range))
        .route("/daily-summary", web::get().to(get_daily_summary))
        .route("/hourly-breakdown", web::get().to(get_hourly_breakdown))
        .route("/overview", web::get().to(get_overview))
        .route("/all", web::get().to(get_all_entries))
}

/// 健康检查路由 `{health_prefix}`
pub fn health_routes(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}

/// 请求体解析失败时返回统一信封而非 actix 默认的纯文本
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        warn!("Rejected request body: {}", err);
        let response = error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            &format!("Invalid request body: {}", err),
        );
        error::InternalError::from_response(err, response).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        warn!("Rejected query string: {}", err);
        let response = error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            &format!("Invalid query parameters: {}", err),
        );
        error::InternalError::from_response(err, response).into()
    })
}
