use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use salonscope_core::RankResult;
use serde::Deserialize;

use super::{parse_body, required, ApiError, AppState};
use crate::middleware::RequestId;
use crate::sourcing::Sourced;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RankCheckRequest {
    keyword: Option<String>,
    shop_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BulkCheckRequest {
    keywords: Option<Vec<String>>,
    shop_name: Option<String>,
}

pub(super) async fn check_ranking(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<RankCheckRequest>, JsonRejection>,
) -> Result<Json<Sourced<RankResult>>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let keyword = required(&req_id.0, body.keyword.as_deref(), "keyword")?;
    let shop_name = required(&req_id.0, body.shop_name.as_deref(), "shopName")?;
    Ok(Json(state.sourcing.rank(keyword, shop_name).await))
}

/// Checks keywords one after another; results keep the request order.
pub(super) async fn bulk_check_ranking(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<BulkCheckRequest>, JsonRejection>,
) -> Result<Json<Sourced<Vec<RankResult>>>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let keywords = body
        .keywords
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                &req_id.0,
                "validation_error",
                "keywords must be a non-empty array",
            )
        })?;
    let shop_name = required(&req_id.0, body.shop_name.as_deref(), "shopName")?;

    tracing::info!(count = keywords.len(), shop_name, "ranking: bulk check");
    Ok(Json(state.sourcing.bulk_rank(keywords, shop_name).await))
}
