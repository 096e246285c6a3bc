use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use fieldmap::mapping::{fieldmap_router, InferenceBackend, MappingCache, MappingResolver};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_fieldmap_routes<C, B>(resolver: Arc<MappingResolver<C, B>>) -> axum::Router
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    fieldmap_router(resolver)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use fieldmap::config::InferenceConfig;
    use fieldmap::mapping::{
        BackendError, ChatRequest, InMemoryMappingCache, InferenceResolver, PortalRegistry,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;

    struct UnreachableModel;

    impl InferenceBackend for UnreachableModel {
        async fn complete(&self, _request: ChatRequest) -> Result<String, BackendError> {
            Err(BackendError::Transport("connection refused".to_string()))
        }
    }

    fn app(ready: bool) -> axum::Router {
        let config = InferenceConfig {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(1),
            markup_budget: 6000,
        };
        let resolver = MappingResolver::new(
            Arc::new(PortalRegistry::builtin().expect("registry")),
            Arc::new(InMemoryMappingCache::new()),
            InferenceResolver::new(Arc::new(UnreachableModel), &config),
        );
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_fieldmap_routes(Arc::new(resolver)).layer(Extension(state))
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 64)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn health_and_readiness_reflect_state() {
        let (status, body) = get_json(app(true), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let (status, body) = get_json(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn unreachable_model_surfaces_as_inference_unavailable() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/fieldmap")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "domain": "portal.example.edu.pk", "formMarkup": "<form></form>" })
                    .to_string(),
            ))
            .expect("request");
        let response = app(true).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = to_bytes(response.into_body(), 1024 * 64)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["kind"], "InferenceUnavailable");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
