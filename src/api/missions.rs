use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::response::{bad_body, parse_id, ApiResponse};
use super::AppState;
use crate::models::{Assignment, Mission, MissionDraft, MissionUpdate};
use crate::services::ServiceError;

pub async fn create_mission(
    State(state): State<AppState>,
    payload: Result<Json<MissionDraft>, JsonRejection>,
) -> Result<ApiResponse<Mission>, ServiceError> {
    let Json(draft) = payload.map_err(bad_body)?;
    Ok(ApiResponse::created(state.missions.create(draft).await?))
}

pub async fn list_missions(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Mission>>, ServiceError> {
    Ok(ApiResponse::ok(state.missions.list().await?))
}

pub async fn get_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Mission>, ServiceError> {
    let id = parse_id(&id, "mission")?;
    Ok(ApiResponse::ok(state.missions.get(id).await?))
}

pub async fn update_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MissionUpdate>, JsonRejection>,
) -> Result<ApiResponse<Mission>, ServiceError> {
    let id = parse_id(&id, "mission")?;
    let Json(update) = payload.map_err(bad_body)?;
    Ok(ApiResponse::ok(state.missions.update(id, update).await?))
}

pub async fn complete_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Mission>, ServiceError> {
    let id = parse_id(&id, "mission")?;
    Ok(ApiResponse::ok(state.missions.complete(id).await?))
}

pub async fn assign_cat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Assignment>, JsonRejection>,
) -> Result<ApiResponse<Mission>, ServiceError> {
    let id = parse_id(&id, "mission")?;
    let Json(assignment) = payload.map_err(bad_body)?;
    Ok(ApiResponse::ok(
        state.missions.assign_cat(id, assignment.cat_id).await?,
    ))
}

pub async fn delete_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<&'static str>, ServiceError> {
    let id = parse_id(&id, "mission")?;
    state.missions.delete(id).await?;
    Ok(ApiResponse::ok("mission successfully deleted"))
}
