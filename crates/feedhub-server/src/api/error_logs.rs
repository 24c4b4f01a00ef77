use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ErrorLogsQuery {
    pub unresolved: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ErrorLogItem {
    id: i64,
    error_type: String,
    feed_id: Uuid,
    message: String,
    status_code: Option<i32>,
    retry_attempts: i32,
    occurrence_count: i32,
    admin_notified: bool,
    resolved: bool,
    resolution_notes: Option<String>,
    occurred_at: DateTime<Utc>,
    last_occurrence: DateTime<Utc>,
}

pub(super) async fn list_error_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ErrorLogsQuery>,
) -> Result<Json<ApiResponse<Vec<ErrorLogItem>>>, ApiError> {
    let rows = feedhub_db::list_error_logs(
        &state.pool,
        query.unresolved.unwrap_or(false),
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ErrorLogItem {
            id: row.id,
            error_type: row.error_type,
            feed_id: row.feed_id,
            message: row.message,
            status_code: row.status_code,
            retry_attempts: row.retry_attempts,
            occurrence_count: row.occurrence_count,
            admin_notified: row.admin_notified,
            resolved: row.resolved,
            resolution_notes: row.resolution_notes,
            occurred_at: row.occurred_at,
            last_occurrence: row.last_occurrence,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
