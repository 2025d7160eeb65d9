use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::constraints::ConstraintCheckError;
use super::domain::{SubeventDraft, SubeventId};
use super::repository::{RepositoryError, SubeventRepository};
use super::rules::SubeventRuleViolation;
use super::service::{SubeventService, SubeventServiceError};

/// Dry-run payload for the relation consistency check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationCheckRequest {
    #[serde(default)]
    pub subject: Option<SubeventId>,
    #[serde(default)]
    pub incompatible: BTreeSet<SubeventId>,
    #[serde(default)]
    pub required: BTreeSet<SubeventId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionRequest {
    pub selected: BTreeSet<SubeventId>,
}

/// Router builder exposing the subevent catalog, relation checks, and selection checks.
pub fn subevent_router<R>(service: Arc<SubeventService<R>>) -> Router
where
    R: SubeventRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/subevents",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/subevents/:subevent_id",
            get(get_handler::<R>).put(update_handler::<R>),
        )
        .route(
            "/api/v1/subevents/:subevent_id/options",
            get(relation_options_handler::<R>),
        )
        .route("/api/v1/subevent-options", get(options_handler::<R>))
        .route(
            "/api/v1/subevent-constraints/check",
            post(check_relations_handler::<R>),
        )
        .route(
            "/api/v1/subevent-selections/check",
            post(check_selection_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<SubeventService<R>>>) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.list() {
        Ok(subevents) => (StatusCode::OK, axum::Json(subevents)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<SubeventService<R>>>,
    Path(subevent_id): Path<u32>,
) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.get(&SubeventId(subevent_id)) {
        Ok(subevent) => (StatusCode::OK, axum::Json(subevent)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<SubeventService<R>>>,
    axum::Json(draft): axum::Json<SubeventDraft>,
) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.create(draft) {
        Ok(subevent) => (StatusCode::CREATED, axum::Json(subevent)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<SubeventService<R>>>,
    Path(subevent_id): Path<u32>,
    axum::Json(draft): axum::Json<SubeventDraft>,
) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.update(&SubeventId(subevent_id), draft) {
        Ok(subevent) => (StatusCode::OK, axum::Json(subevent)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn relation_options_handler<R>(
    State(service): State<Arc<SubeventService<R>>>,
    Path(subevent_id): Path<u32>,
) -> Response
where
    R: SubeventRepository + 'static,
{
    let id = SubeventId(subevent_id);
    let result = service
        .get(&id)
        .and_then(|_| service.options(Some(&id), false));
    match result {
        Ok(options) => (StatusCode::OK, axum::Json(options)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn options_handler<R>(State(service): State<Arc<SubeventService<R>>>) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.options(None, true) {
        Ok(options) => (StatusCode::OK, axum::Json(options)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_relations_handler<R>(
    State(service): State<Arc<SubeventService<R>>>,
    axum::Json(request): axum::Json<RelationCheckRequest>,
) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.check_relations(
        request.subject.as_ref(),
        &request.incompatible,
        &request.required,
    ) {
        Ok(check) => (StatusCode::OK, axum::Json(check)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_selection_handler<R>(
    State(service): State<Arc<SubeventService<R>>>,
    axum::Json(request): axum::Json<SelectionRequest>,
) -> Response
where
    R: SubeventRepository + 'static,
{
    match service.check_selection(&request.selected) {
        Ok(report) => {
            let acceptable = report.is_acceptable();
            let payload = json!({
                "acceptable": acceptable,
                "report": report,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: SubeventServiceError) -> Response {
    match error {
        SubeventServiceError::Rule(SubeventRuleViolation::RelationCollision(violation)) => {
            let payload = json!({
                "error": violation.summary(),
                "violation": violation,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        SubeventServiceError::Rule(rule) => {
            let payload = json!({ "error": rule.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        SubeventServiceError::Repository(RepositoryError::NotFound(id))
        | SubeventServiceError::Constraint(ConstraintCheckError::Repository(
            RepositoryError::NotFound(id),
        )) => {
            let payload = json!({
                "error": format!("subevent {id} not found"),
                "subevent_id": id,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        SubeventServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "subevent already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
