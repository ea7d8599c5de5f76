//! Entity CRUD handlers: create, read, update, delete, list.

use crate::error::AppError;
use crate::response;
use crate::service::{CrudService, DEFAULT_LIMIT, DEFAULT_SKIP};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadInput(format!("invalid id '{}'", id_str)))
}

fn parse_count(name: &str, value: Option<&String>, default: i64) -> Result<i64, AppError> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(AppError::BadInput(format!(
            "{} must be a non-negative integer no greater than {}",
            name,
            i64::MAX
        ))),
    }
}

/// Accept a bare JSON object or one wrapped as `{"data": {...}}`.
pub fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadInput(e.body_text()))?;
    match value {
        Value::Object(mut m) => {
            if m.len() == 1 && matches!(m.get("data"), Some(Value::Object(_))) {
                if let Some(Value::Object(inner)) = m.remove("data") {
                    return Ok(inner);
                }
            }
            Ok(m)
        }
        _ => Err(AppError::BadInput("body must be a JSON object".into())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let skip = parse_count("skip", params.get("skip"), DEFAULT_SKIP)?;
    let limit = parse_count("limit", params.get("limit"), DEFAULT_LIMIT)?;
    tracing::info!(table = %table, skip, limit, "listing items");
    let entity = state.model.entity(&table)?;
    let rows = CrudService::list(&state.pool, entity, skip, limit).await?;
    Ok(response::ok_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Path(table): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(table = %table, "creating item");
    let entity = state.model.entity(&table)?;
    let data = body_to_map(body)?;
    let row = CrudService::create(&state.pool, entity, data).await?;
    Ok(response::created(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((table, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(table = %table, id = %id_str, "reading item");
    let entity = state.model.entity(&table)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, entity, id).await?;
    Ok(response::ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((table, id_str)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(table = %table, id = %id_str, "updating item");
    let entity = state.model.entity(&table)?;
    let id = parse_id(&id_str)?;
    let data = body_to_map(body)?;
    let row = CrudService::update(&state.pool, entity, id, data).await?;
    Ok(response::ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((table, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(table = %table, id = %id_str, "deleting item");
    let entity = state.model.entity(&table)?;
    let id = parse_id(&id_str)?;
    CrudService::delete(&state.pool, entity, id).await?;
    Ok(response::deleted())
}
