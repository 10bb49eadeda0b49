// HTTP boundary: routing, envelope encoding and error-to-status mapping

pub mod cats;
pub mod missions;
pub mod response;
pub mod targets;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::services::{CatService, MissionService, TargetService};
use crate::telemetry::request_span;
use response::ApiResponse;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub cats: Arc<CatService>,
    pub missions: Arc<MissionService>,
    pub targets: Arc<TargetService>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> ApiResponse<Health> {
    ApiResponse::ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cats", get(cats::list_cats).post(cats::create_cat))
        .route(
            "/cats/{id}",
            get(cats::get_cat)
                .put(cats::update_salary)
                .delete(cats::delete_cat),
        )
        .route(
            "/missions",
            get(missions::list_missions).post(missions::create_mission),
        )
        .route(
            "/missions/{id}",
            get(missions::get_mission)
                .put(missions::update_mission)
                .delete(missions::delete_mission),
        )
        .route("/missions/{id}/complete", put(missions::complete_mission))
        .route("/missions/{id}/assign", put(missions::assign_cat))
        .route("/missions/{id}/targets", post(targets::add_target))
        .route(
            "/missions/{id}/targets/{target_id}",
            delete(targets::delete_target),
        )
        .route(
            "/missions/{id}/targets/{target_id}/complete",
            put(targets::complete_target),
        )
        .route("/targets", put(targets::update_target))
        .route("/targets/{id}/notes", put(targets::update_notes))
        .with_state(state)
        .layer(CatchPanicLayer::custom(response::panic_response))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| request_span(request)))
}
