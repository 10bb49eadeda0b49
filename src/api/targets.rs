use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::response::{bad_body, parse_id, ApiResponse};
use super::AppState;
use crate::models::{NotesUpdate, Target, TargetDraft, TargetUpdate};
use crate::services::ServiceError;

pub async fn update_target(
    State(state): State<AppState>,
    payload: Result<Json<TargetUpdate>, JsonRejection>,
) -> Result<ApiResponse<Target>, ServiceError> {
    let Json(update) = payload.map_err(bad_body)?;
    Ok(ApiResponse::ok(state.targets.update(update).await?))
}

pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NotesUpdate>, JsonRejection>,
) -> Result<ApiResponse<Target>, ServiceError> {
    let id = parse_id(&id, "target")?;
    let Json(update) = payload.map_err(bad_body)?;
    Ok(ApiResponse::ok(
        state.targets.update_notes(id, &update.notes).await?,
    ))
}

pub async fn complete_target(
    State(state): State<AppState>,
    Path((mission_id, target_id)): Path<(String, String)>,
) -> Result<ApiResponse<Target>, ServiceError> {
    let mission_id = parse_id(&mission_id, "mission")?;
    let target_id = parse_id(&target_id, "target")?;
    Ok(ApiResponse::ok(
        state.targets.complete(mission_id, target_id).await?,
    ))
}

pub async fn delete_target(
    State(state): State<AppState>,
    Path((mission_id, target_id)): Path<(String, String)>,
) -> Result<ApiResponse<&'static str>, ServiceError> {
    let mission_id = parse_id(&mission_id, "mission")?;
    let target_id = parse_id(&target_id, "target")?;
    state.targets.delete(mission_id, target_id).await?;
    Ok(ApiResponse::ok("target successfully deleted"))
}

pub async fn add_target(
    State(state): State<AppState>,
    Path(mission_id): Path<String>,
    payload: Result<Json<TargetDraft>, JsonRejection>,
) -> Result<ApiResponse<Target>, ServiceError> {
    let mission_id = parse_id(&mission_id, "mission")?;
    let Json(draft) = payload.map_err(bad_body)?;
    Ok(ApiResponse::created(
        state.targets.add(mission_id, draft).await?,
    ))
}
