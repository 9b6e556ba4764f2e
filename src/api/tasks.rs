//! Task execution endpoints
//!
//! A task that reaches an agent always answers 200; callers must check
//! `task.status`. Non-2xx means no agent was invoked.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use onsa_core::{DispatchOutcome, TaskDispatcher, TaskRequest};
use std::sync::Arc;

use super::error::ApiResult;

pub fn task_routes() -> Router {
    Router::new()
        .route("/a2a/task", post(execute_task))
        .route("/a2a/agents/:agent_id/task", post(execute_agent_task))
}

async fn execute_task(
    Extension(dispatcher): Extension<Arc<TaskDispatcher>>,
    request: Result<Json<TaskRequest>, JsonRejection>,
) -> ApiResult<DispatchOutcome> {
    let Json(request) = request?;
    Ok(Json(dispatcher.dispatch(request).await?))
}

async fn execute_agent_task(
    Extension(dispatcher): Extension<Arc<TaskDispatcher>>,
    Path(agent_id): Path<String>,
    request: Result<Json<TaskRequest>, JsonRejection>,
) -> ApiResult<DispatchOutcome> {
    let Json(request) = request?;
    Ok(Json(dispatcher.dispatch_to(&agent_id, request).await?))
}
