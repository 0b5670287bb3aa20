use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::Utc;
use salonscope_core::{DataMode, ShopDetail, ShopSnapshot};
use serde::Serialize;

use super::{parse_body, ApiError, AppState, UrlRequest};
use crate::middleware::RequestId;
use crate::sourcing::Sourced;

#[derive(Debug, Serialize)]
pub(super) struct SnapshotResponse {
    data: ShopSnapshot,
    timestamp: i64,
    mode: DataMode,
}

pub(super) async fn get_shop_details(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<Sourced<ShopDetail>>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let url = body.validate(&req_id.0)?;
    Ok(Json(state.sourcing.shop_detail(url).await))
}

/// One-page summary of an arbitrary shop URL on the listings site.
pub(super) async fn scrape_url(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let url = body.validate(&req_id.0)?;
    let snapshot = state.sourcing.shop_snapshot(url).await;
    Ok(Json(SnapshotResponse {
        data: snapshot.data,
        timestamp: Utc::now().timestamp_millis(),
        mode: snapshot.mode,
    }))
}
