// rest/routes/tasks.rs — Task CRUD routes.
//
// Each handler maps to exactly one store operation. All validation runs
// before the store is touched; side effects are confined to the single
// row addressed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::error::ApiError;
use crate::tasks::{Task, TaskStatus};
use crate::AppContext;

const INVALID_ID: &str = "Invalid task ID";
const INVALID_STATUS: &str = "Invalid status. Must be 'pending' or 'done'";

/// Parse a path segment as a task id. Non-numeric ids are rejected before
/// any store call.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::invalid(INVALID_ID))
}

/// A required non-empty text field. Missing and empty are the same failure.
fn require_text(field: Option<String>, message: &str) -> Result<String, ApiError> {
    match field {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ApiError::invalid(message)),
    }
}

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let rows = ctx.storage.list_tasks().await?;
    let tasks = rows
        .into_iter()
        .map(|row| row.into_task())
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    match ctx.storage.get_task(id).await? {
        Some(row) => Ok(Json(row.into_task()?)),
        None => Err(ApiError::NotFound),
    }
}

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    const REQUIRED: &str = "Title and description are required";
    let title = require_text(body.title, REQUIRED)?;
    let description = require_text(body.description, REQUIRED)?;
    let status = match body.status {
        Some(raw) => TaskStatus::parse(&raw).ok_or_else(|| ApiError::invalid(INVALID_STATUS))?,
        None => TaskStatus::Pending,
    };

    let row = ctx.storage.create_task(&title, &description, status).await?;
    Ok((StatusCode::CREATED, Json(row.into_task()?)))
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Full replace — all three mutable fields are required. No partial-field
/// update path exists.
pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    const REQUIRED: &str = "Title, description, and status are required";
    let id = parse_id(&id)?;
    let title = require_text(body.title, REQUIRED)?;
    let description = require_text(body.description, REQUIRED)?;
    let raw_status = require_text(body.status, REQUIRED)?;
    let status =
        TaskStatus::parse(&raw_status).ok_or_else(|| ApiError::invalid(INVALID_STATUS))?;

    match ctx
        .storage
        .update_task(id, &title, &description, status)
        .await?
    {
        Some(row) => Ok(Json(row.into_task()?)),
        None => Err(ApiError::NotFound),
    }
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if ctx.storage.delete_task(id).await? {
        Ok(Json(json!({ "message": "Task deleted successfully" })))
    } else {
        Err(ApiError::NotFound)
    }
}
