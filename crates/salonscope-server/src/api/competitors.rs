use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use salonscope_core::{CompetitorRecord, DataMode};
use serde::Serialize;

use super::{parse_body, ApiError, AppState, AreaRequest};
use crate::cache::CacheEntry;
use crate::middleware::RequestId;
use crate::sourcing::Sourced;

#[derive(Debug, Serialize)]
pub(super) struct TrackResponse {
    data: Vec<CompetitorRecord>,
    cached: bool,
    /// Milliseconds since the epoch at which `data` was acquired.
    timestamp: i64,
    mode: DataMode,
}

impl TrackResponse {
    fn from_entry(entry: CacheEntry<Sourced<Vec<CompetitorRecord>>>, cached: bool) -> Self {
        Self {
            data: entry.data.data,
            cached,
            timestamp: entry.timestamp.timestamp_millis(),
            mode: entry.data.mode,
        }
    }
}

pub(super) async fn track_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AreaRequest>, JsonRejection>,
) -> Result<Json<TrackResponse>, ApiError> {
    let body = parse_body(&req_id.0, body)?;
    let (area, service) = body.validate(&req_id.0)?;
    let key = format!("{area}_{service}");

    if let Some(entry) = state.competitors.get_fresh(&key, state.cache_ttl).await {
        tracing::info!(area, service, "competitors: serving cached listing");
        return Ok(Json(TrackResponse::from_entry(entry, true)));
    }

    let listing = state.sourcing.competitors(area, service).await;
    let entry = state.competitors.put(key, listing).await;
    Ok(Json(TrackResponse::from_entry(entry, false)))
}
