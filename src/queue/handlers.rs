use super::TaskQueue;
use super::error::QueueError;
use super::protocol::*;
use super::types::*;

use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::Path, http::StatusCode};
use std::sync::Arc;

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Builds the queue server's router around any `TaskQueue` backend.
pub fn router(queue: Arc<dyn TaskQueue>) -> Router {
    Router::new()
        .route(ENDPOINT_CREATE_TASK, post(handle_create_task))
        .route(ENDPOINT_TASK_RUNS, get(handle_poll_task))
        .route(ENDPOINT_ORGANIZATIONS, get(handle_list_organizations))
        .route(ENDPOINT_CLAIM_RUN, post(handle_claim_run))
        .route(ENDPOINT_RENEW_LEASE, post(handle_renew_lease))
        .route(ENDPOINT_COMPLETE_RUN, post(handle_complete_run))
        .layer(Extension(queue))
}

fn status_for(err: &QueueError) -> StatusCode {
    match err {
        QueueError::EmptyTargets
        | QueueError::UnknownTarget(_)
        | QueueError::UnknownSession(_)
        | QueueError::Malformed(_) => StatusCode::BAD_REQUEST,
        QueueError::UnknownTask(_) | QueueError::UnknownRun(_) => StatusCode::NOT_FOUND,
        QueueError::NotRunning { .. } | QueueError::NotAssigned { .. } => StatusCode::CONFLICT,
        QueueError::Rejected { .. } | QueueError::Unreachable(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reject(err: QueueError) -> HandlerError {
    (status_for(&err), Json(ErrorResponse::from(&err)))
}

pub async fn handle_create_task(
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Json(req): Json<NewTask>,
) -> Result<Json<TaskHandle>, HandlerError> {
    match queue.create_task(req).await {
        Ok(handle) => {
            tracing::info!(task_id = %handle.task_id, "Task submitted");
            Ok(Json(handle))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Task creation rejected");
            Err(reject(e))
        }
    }
}

pub async fn handle_poll_task(
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Path(task_id): Path<String>,
) -> Result<Json<PollResponse>, HandlerError> {
    let task_id = TaskId(task_id);
    let runs = queue.poll(&task_id).await.map_err(reject)?;

    tracing::debug!(task_id = %task_id, runs = runs.len(), "Task polled");
    Ok(Json(PollResponse { task_id, runs }))
}

pub async fn handle_list_organizations(
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
) -> Result<Json<OrganizationsResponse>, HandlerError> {
    let organizations = queue.list_organizations().await.map_err(reject)?;
    Ok(Json(OrganizationsResponse { organizations }))
}

pub async fn handle_claim_run(
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Json(req): Json<ClaimRunRequest>,
) -> Result<Json<ClaimRunResponse>, HandlerError> {
    let run = queue
        .claim_run(req.organization, &req.worker)
        .await
        .map_err(reject)?;
    Ok(Json(ClaimRunResponse { run }))
}

pub async fn handle_renew_lease(
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    queue.renew_lease(&RunId(run_id)).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_complete_run(
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Path(run_id): Path<String>,
    Json(req): Json<CompleteRunRequest>,
) -> Result<StatusCode, HandlerError> {
    let run_id = RunId(run_id);
    queue
        .complete_run(&run_id, &req.worker, req.outcome)
        .await
        .map_err(reject)?;

    tracing::debug!(run_id = %run_id, "Stored run outcome");
    Ok(StatusCode::NO_CONTENT)
}
