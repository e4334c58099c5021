use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::api::{json_response, ApiState};
use crate::error::{JobError, Result};
use crate::scheduler::{JobId, JobRequest, StatusCounts};

#[derive(Serialize)]
struct SubmitJobResponse {
    #[serde(rename = "jobID")]
    job_id: JobId,
}

#[derive(Serialize)]
struct InfoResponse {
    info: StatusCounts,
    total: usize,
}

pub(super) async fn submit_job_handler(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<JobRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| JobError::Validation(e.body_text()))?;
    let job_id = state.coordinator.submit(request)?;

    Ok(json_response(
        StatusCode::ACCEPTED,
        &SubmitJobResponse { job_id },
    ))
}

pub(super) async fn list_jobs_handler(State(state): State<ApiState>) -> Response {
    json_response(StatusCode::OK, &state.coordinator.list())
}

pub(super) async fn get_job_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let job_id: JobId = id.parse()?;
    let result = state.coordinator.get(&job_id)?;
    Ok(json_response(StatusCode::OK, &result))
}

pub(super) async fn cancel_job_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let job_id: JobId = id.parse()?;
    let snapshot = state.coordinator.cancel(&job_id)?;
    Ok(json_response(StatusCode::OK, &snapshot))
}

pub(super) async fn info_handler(State(state): State<ApiState>) -> Response {
    let info = state.coordinator.info();
    json_response(
        StatusCode::OK,
        &InfoResponse {
            total: info.total(),
            info,
        },
    )
}
