/// API Request Handlers
///
/// Thin axum wrappers around `MetricsProvider`. The response bodies are the
/// flat JSON payloads the dashboard decodes; a sampling failure surfaces as
/// a bare 500 and the client's retry loop is the recovery path.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::cli::get_version;
use crate::core::metrics::{GreetingPayload, HealthPayload, MetricsProvider, SystemSnapshot};

type SharedProvider = Arc<MetricsProvider>;

pub async fn hello(State(provider): State<SharedProvider>) -> Json<GreetingPayload> {
    Json(provider.greeting())
}

pub async fn system_info(
    State(provider): State<SharedProvider>,
) -> Result<Json<SystemSnapshot>, StatusCode> {
    let snapshot = provider.sample().await.map_err(|e| {
        tracing::error!(error = %e, "system sampling failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(snapshot))
}

pub async fn health_check(State(provider): State<SharedProvider>) -> Json<HealthPayload> {
    Json(provider.health())
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Pulse Metrics API",
        "version": get_version(),
        "health": "/health",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::server::create_router;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> axum::Router {
        let settings = Settings {
            environment: "production".to_string(),
            hostname: Some("pi".to_string()),
            ..Settings::default()
        };
        create_router(Arc::new(MetricsProvider::new(&settings)), false)
    }

    async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_hello_endpoint() {
        let (status, body) = get_json("/api/v1/hello").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_system_info_endpoint() {
        let (status, body) = get_json("/api/v1/info").await;

        assert_eq!(status, StatusCode::OK);
        let cpu = body["cpu_percent"].as_f64().unwrap();
        let memory = body["memory_percent"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&cpu));
        assert!((0.0..=100.0).contains(&memory));
        assert_eq!(body["hostname"], "pi");
        assert_eq!(body["environment"], "production");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = get_json("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "backend");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = get_json("/api/v1/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
