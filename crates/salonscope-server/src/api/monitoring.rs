use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use salonscope_core::{DataMode, RankResult};
use serde::{Deserialize, Serialize};

use super::{parse_body, required, ApiError, AppState, Monitoring};
use crate::middleware::RequestId;
use crate::scheduler::{schedule::DEFAULT_SCHEDULE, MonitorError, MonitoringTask};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StartRequest {
    task_id: Option<String>,
    keywords: Option<Vec<String>>,
    shop_name: Option<String>,
    schedule: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StopRequest {
    task_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskAck {
    message: &'static str,
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<DataMode>,
}

#[derive(Debug, Serialize)]
pub(super) struct ResultsBody {
    results: Vec<RankResult>,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ResultsResponse {
    data: ResultsBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<DataMode>,
}

pub(super) fn map_monitor_error(request_id: &str, error: &MonitorError) -> ApiError {
    match error {
        MonitorError::InvalidSchedule { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        MonitorError::NotFound(_) => ApiError::new(request_id, "not_found", "task not found"),
        MonitorError::Scheduler(e) => {
            tracing::error!(error = %e, "monitoring: scheduler failure");
            ApiError::new(request_id, "internal_error", "scheduler failure")
        }
    }
}

pub(super) async fn start_monitoring(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = parse_body(&req_id.0, body)?;

    let Monitoring::Scheduled(registry) = &state.monitoring else {
        tracing::info!(task_id = ?body.task_id, "monitoring: start ignored in lite profile");
        return Ok(Json(TaskAck {
            message: "Monitoring is not available in the lite profile",
            task_id: body.task_id,
            schedule: None,
            mode: Some(DataMode::Demo),
        })
        .into_response());
    };

    let task_id = required(&req_id.0, body.task_id.as_deref(), "taskId")?;
    let keywords = body
        .keywords
        .as_ref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                &req_id.0,
                "validation_error",
                "keywords must be a non-empty array",
            )
        })?;
    let shop_name = required(&req_id.0, body.shop_name.as_deref(), "shopName")?;
    let schedule = body
        .schedule
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCHEDULE);

    let task = MonitoringTask {
        task_id: task_id.to_string(),
        keywords: keywords.clone(),
        shop_name: shop_name.to_string(),
        schedule: schedule.to_string(),
    };
    let cron = registry
        .start(task)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, &e))?;

    Ok(Json(TaskAck {
        message: "Monitoring task started",
        task_id: Some(task_id.to_string()),
        schedule: Some(cron),
        mode: None,
    })
    .into_response())
}

pub(super) async fn stop_monitoring(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<StopRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = parse_body(&req_id.0, body)?;

    let Monitoring::Scheduled(registry) = &state.monitoring else {
        return Ok(Json(TaskAck {
            message: "Monitoring stopped (lite profile)",
            task_id: body.task_id,
            schedule: None,
            mode: Some(DataMode::Demo),
        })
        .into_response());
    };

    let task_id = required(&req_id.0, body.task_id.as_deref(), "taskId")?;
    registry
        .stop(task_id)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, &e))?;

    Ok(Json(TaskAck {
        message: "Monitoring task stopped",
        task_id: Some(task_id.to_string()),
        schedule: None,
        mode: None,
    })
    .into_response())
}

pub(super) async fn get_monitoring_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(task_id): Path<String>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let Monitoring::Scheduled(registry) = &state.monitoring else {
        return Ok(Json(ResultsResponse {
            data: ResultsBody {
                results: Vec::new(),
                timestamp: Utc::now().timestamp_millis(),
            },
            mode: Some(DataMode::Demo),
        }));
    };

    let entry = registry.results(&task_id).await.ok_or_else(|| {
        ApiError::new(
            &req_id.0,
            "not_found",
            format!("no results found for task {task_id}"),
        )
    })?;

    Ok(Json(ResultsResponse {
        data: ResultsBody {
            results: entry.data,
            timestamp: entry.timestamp.timestamp_millis(),
        },
        mode: None,
    }))
}
