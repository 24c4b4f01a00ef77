use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct NotificationsQuery {
    /// Window in minutes; out-of-range values fall back to the default.
    pub interval: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct NotificationItem {
    id: i64,
    feed_id: Uuid,
    feed_name: String,
    post_count: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct UserNotificationsData {
    window_minutes: i64,
    notifications: Vec<NotificationItem>,
}

pub(super) async fn list_user_notifications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<ApiResponse<UserNotificationsData>>, ApiError> {
    let result = feedhub_ingest::notifications_for_user(
        state.store.as_ref(),
        &state.notifications,
        user_id,
        query.interval,
        Utc::now(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let notifications = result
        .notifications
        .into_iter()
        .map(|n| NotificationItem {
            id: n.id,
            feed_id: n.feed_id,
            feed_name: n.feed_name,
            post_count: n.post_count,
            created_at: n.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: UserNotificationsData {
            window_minutes: result.window_minutes,
            notifications,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
