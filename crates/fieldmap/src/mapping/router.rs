use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::cache::MappingCache;
use super::domain::MappingEntry;
use super::inference::InferenceBackend;
use super::plan::{FillPlan, StudentProfile};
use super::resolver::{MappingResolver, ResolutionError};

#[derive(Debug, Deserialize)]
pub(crate) struct DomainQuery {
    #[serde(default)]
    domain: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InferRequest {
    #[serde(default)]
    domain: String,
    #[serde(default, alias = "formHTML")]
    form_markup: Option<String>,
    #[serde(default, alias = "universitySlug")]
    slug_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifiedRequest {
    domain: String,
    entries: Vec<MappingEntry>,
    #[serde(default)]
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanRequest {
    domain: String,
    profile: StudentProfile,
}

/// Router exposing lookup, inference, correction and fill-plan endpoints.
pub fn fieldmap_router<C, B>(resolver: Arc<MappingResolver<C, B>>) -> Router
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    Router::new()
        .route(
            "/api/fieldmap",
            get(lookup_handler::<C, B>)
                .post(infer_handler::<C, B>)
                .delete(invalidate_handler::<C, B>),
        )
        .route("/api/fieldmap/verified", put(verified_handler::<C, B>))
        .route("/api/fieldmap/plan", post(plan_handler::<C, B>))
        .route("/api/portals", get(portals_handler::<C, B>))
        .with_state(resolver)
}

pub(crate) async fn lookup_handler<C, B>(
    State(resolver): State<Arc<MappingResolver<C, B>>>,
    Query(query): Query<DomainQuery>,
) -> Response
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    let Some(domain) = query.domain.filter(|domain| !domain.trim().is_empty()) else {
        return missing_domain();
    };

    match resolver.lookup(&domain) {
        Ok(Some(mapping)) => (StatusCode::OK, axum::Json(json!({ "mapping": mapping }))).into_response(),
        Ok(None) => {
            let payload = json!({
                "mapping": serde_json::Value::Null,
                "message": format!("No field mapping cached for domain: {domain}"),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => resolution_error(err),
    }
}

pub(crate) async fn infer_handler<C, B>(
    State(resolver): State<Arc<MappingResolver<C, B>>>,
    axum::Json(request): axum::Json<InferRequest>,
) -> Response
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    let Some(markup) = request
        .form_markup
        .as_deref()
        .filter(|markup| !markup.trim().is_empty())
        .filter(|_| !request.domain.trim().is_empty())
    else {
        let payload = json!({
            "error": "Missing required fields: domain, formMarkup",
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    let outcome = resolver
        .resolve(&request.domain, Some(markup), request.slug_hint.as_deref())
        .await;

    match outcome {
        Ok(mapping) => (StatusCode::OK, axum::Json(json!({ "mapping": mapping }))).into_response(),
        Err(err) => resolution_error(err),
    }
}

pub(crate) async fn verified_handler<C, B>(
    State(resolver): State<Arc<MappingResolver<C, B>>>,
    axum::Json(request): axum::Json<VerifiedRequest>,
) -> Response
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    match resolver.record_verified(&request.domain, request.entries, request.slug) {
        Ok(mapping) => (StatusCode::OK, axum::Json(json!({ "mapping": mapping }))).into_response(),
        Err(err) => resolution_error(err),
    }
}

pub(crate) async fn invalidate_handler<C, B>(
    State(resolver): State<Arc<MappingResolver<C, B>>>,
    Query(query): Query<DomainQuery>,
) -> Response
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    let Some(domain) = query.domain.filter(|domain| !domain.trim().is_empty()) else {
        return missing_domain();
    };

    match resolver.invalidate(&domain) {
        Ok(removed) => {
            let payload = json!({
                "domain": domain,
                "removed": removed,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => resolution_error(err),
    }
}

pub(crate) async fn plan_handler<C, B>(
    State(resolver): State<Arc<MappingResolver<C, B>>>,
    axum::Json(request): axum::Json<PlanRequest>,
) -> Response
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    let mapping = match resolver.lookup(&request.domain) {
        Ok(Some(mapping)) => mapping,
        Ok(None) => {
            return resolution_error(ResolutionError::NoMappingAvailable {
                domain: request.domain,
            })
        }
        Err(err) => return resolution_error(err),
    };

    match FillPlan::build(&mapping, &request.profile) {
        Ok(plan) => (StatusCode::OK, axum::Json(plan)).into_response(),
        Err(err) => {
            let payload = json!({
                "error": err.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn portals_handler<C, B>(
    State(resolver): State<Arc<MappingResolver<C, B>>>,
) -> Response
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    let portals: Vec<_> = resolver
        .registry()
        .profiles()
        .iter()
        .map(|profile| profile.summary())
        .collect();
    (StatusCode::OK, axum::Json(json!({ "portals": portals }))).into_response()
}

fn missing_domain() -> Response {
    let payload = json!({
        "error": "domain query parameter is required",
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

pub(crate) fn resolution_status(err: &ResolutionError) -> StatusCode {
    match err {
        ResolutionError::InvalidDomain(_) => StatusCode::BAD_REQUEST,
        ResolutionError::NoMappingAvailable { .. } => StatusCode::NOT_FOUND,
        ResolutionError::InferenceUnavailable(_)
        | ResolutionError::MalformedResponse(_)
        | ResolutionError::EmptyMapping { .. } => StatusCode::BAD_GATEWAY,
        ResolutionError::ImmutableVerifiedMapping { .. }
        | ResolutionError::StaticProfile { .. } => StatusCode::CONFLICT,
        ResolutionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn resolution_error(err: ResolutionError) -> Response {
    let status = resolution_status(&err);
    if status.is_server_error() {
        tracing::warn!(kind = err.kind(), error = %err, "mapping request failed");
    }
    let payload = json!({
        "kind": err.kind(),
        "detail": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
