use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use salonscope_core::MarketAnalysis;

use super::{parse_body, ApiError, AppState, AreaRequest};
use crate::middleware::RequestId;
use crate::sourcing::Sourced;

/// Aggregates a fresh (never cached) competitor listing.
pub(super) async fn analyze_market(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AreaRequest>, JsonRejection>,
) -> Result<Json<Sourced<MarketAnalysis>>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let (area, service) = body.validate(&req_id.0)?;

    let listing = state.sourcing.competitors(area, service).await;
    let analysis = salonscope_core::analyze_market(area, service, &listing.data);
    tracing::info!(
        area,
        service,
        competitors = analysis.competitor_count,
        "market: analysis complete"
    );

    Ok(Json(Sourced {
        data: analysis,
        mode: listing.mode,
    }))
}
