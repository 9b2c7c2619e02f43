//! Entry endpoints

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{Responder, Result as ActixResult, web};
use tracing::trace;

use crate::services::{EntryDraft, EntryService};

use super::helpers::served_result;
use super::types::{DateQuery, EntryKeyQuery, RangeQuery};

/// POST /entry
pub async fn post_entry(
    body: web::Json<EntryDraft>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    trace!("Received entry: {:?}", body);
    let result = service.upsert(body.into_inner()).await;
    Ok(served_result(
        result,
        StatusCode::CREATED,
        "Entry saved successfully",
    ))
}

/// GET /entries-by-date?date=
pub async fn get_entries_by_date(
    query: web::Query<DateQuery>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service.entries_for_day(query.date.as_deref()).await;
    Ok(served_result(result, StatusCode::OK, "OK"))
}

/// GET /entries-by-range?startDate=&endDate=
pub async fn get_entries_by_range(
    query: web::Query<RangeQuery>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service
        .entries_for_range(query.start_date.as_deref(), query.end_date.as_deref())
        .await;
    Ok(served_result(result, StatusCode::OK, "OK"))
}

/// GET /daily-summary?startDate=&endDate=
pub async fn get_daily_summary(
    query: web::Query<RangeQuery>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service
        .daily_summary(query.start_date.as_deref(), query.end_date.as_deref())
        .await;
    Ok(served_result(result, StatusCode::OK, "OK"))
}

/// GET /hourly-breakdown?date=
pub async fn get_hourly_breakdown(
    query: web::Query<DateQuery>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service.hourly_breakdown(query.date.as_deref()).await;
    Ok(served_result(result, StatusCode::OK, "OK"))
}

/// GET /overview?startDate=&endDate=
pub async fn get_overview(
    query: web::Query<RangeQuery>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service
        .overview(query.start_date.as_deref(), query.end_date.as_deref())
        .await;
    Ok(served_result(result, StatusCode::OK, "OK"))
}

/// DELETE /entry?date=&hour=
pub async fn delete_entry(
    query: web::Query<EntryKeyQuery>,
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service.delete(query.date.as_deref(), query.hour).await;
    Ok(served_result(
        result,
        StatusCode::OK,
        "Entry deleted successfully",
    ))
}

/// GET /all
pub async fn get_all_entries(
    service: web::Data<Arc<EntryService>>,
) -> ActixResult<impl Responder> {
    let result = service.list_all().await;
    Ok(served_result(result, StatusCode::OK, "OK"))
}
