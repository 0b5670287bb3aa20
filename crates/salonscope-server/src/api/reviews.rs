use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use salonscope_core::{DataMode, ReviewRecord};
use serde::Serialize;

use super::{parse_body, ApiError, AppState, UrlRequest};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(super) struct ReviewsResponse {
    data: Vec<ReviewRecord>,
    count: usize,
    mode: DataMode,
}

pub(super) async fn fetch_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let url = body.validate(&req_id.0)?;
    let reviews = state.sourcing.reviews(url).await;
    Ok(Json(ReviewsResponse {
        count: reviews.data.len(),
        data: reviews.data,
        mode: reviews.mode,
    }))
}
