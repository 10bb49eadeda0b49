use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::response::{bad_body, parse_id, ApiResponse};
use super::AppState;
use crate::models::{Cat, NewCat, SalaryUpdate};
use crate::services::ServiceError;

pub async fn create_cat(
    State(state): State<AppState>,
    payload: Result<Json<NewCat>, JsonRejection>,
) -> Result<ApiResponse<Cat>, ServiceError> {
    let Json(cat) = payload.map_err(bad_body)?;
    let cat = state.cats.create(cat).await?;
    Ok(ApiResponse::created(cat))
}

pub async fn list_cats(State(state): State<AppState>) -> Result<ApiResponse<Vec<Cat>>, ServiceError> {
    Ok(ApiResponse::ok(state.cats.list().await?))
}

pub async fn get_cat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Cat>, ServiceError> {
    let id = parse_id(&id, "cat")?;
    Ok(ApiResponse::ok(state.cats.get(id).await?))
}

pub async fn update_salary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SalaryUpdate>, JsonRejection>,
) -> Result<ApiResponse<Cat>, ServiceError> {
    let id = parse_id(&id, "cat")?;
    let Json(update) = payload.map_err(bad_body)?;
    Ok(ApiResponse::ok(state.cats.update_salary(id, update.salary).await?))
}

pub async fn delete_cat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<&'static str>, ServiceError> {
    let id = parse_id(&id, "cat")?;
    state.cats.delete(id).await?;
    Ok(ApiResponse::ok("cat successfully deleted"))
}
