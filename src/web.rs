use crate::{
    ai::CapabilityFlags,
    app::{
        message::{Request, Response},
        Coordinator,
    },
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    coordinator: Arc<Coordinator>,
}

pub fn router(coordinator: Arc<Coordinator>) -> Router {
    let shared_state = Arc::new(SharedState { coordinator });

    Router::new()
        .route("/api/message", post(message))
        .route("/api/capabilities", get(capabilities))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

pub async fn serve(coordinator: Arc<Coordinator>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(coordinator);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::warn!("ctrl+c received, shutting down"),
        _ = terminate => log::warn!("terminate received, shutting down"),
    }
}

/// Malformed messages are the only thing answered with an HTTP error.
#[derive(Debug)]
struct HttpError(JsonRejection);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        log::warn!("rejected message: {}", self.0.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": self.0.body_text()})),
        )
            .into_response()
    }
}

async fn message(
    State(state): State<Arc<SharedState>>,
    payload: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, HttpError> {
    let Json(request) = payload.map_err(HttpError)?;

    Ok(Json(state.coordinator.dispatch(request).await))
}

async fn capabilities(State(state): State<Arc<SharedState>>) -> Json<CapabilityFlags> {
    Json(state.coordinator.get_capabilities())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::coordinator_with;
    use crate::tests::{ScriptedAi, StaticPage};
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_message_route_dispatches_by_action() {
        let (coordinator, _tmp) =
            coordinator_with(ScriptedAi::default(), StaticPage::html("<p>hello</p>")).await;
        let app = router(Arc::new(coordinator));

        let (status, value) = call(
            app.clone(),
            "POST",
            "/api/message",
            r#"{"action":"savePage","tab":{"title":"Hello","url":"https://example.com"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);
        assert_eq!(value["entry"]["title"], "Hello");

        let (status, value) =
            call(app, "POST", "/api/message", r#"{"action":"getAllPages"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_action_is_bad_request() {
        let (coordinator, _tmp) =
            coordinator_with(ScriptedAi::default(), StaticPage::html("")).await;
        let app = router(Arc::new(coordinator));

        let (status, value) =
            call(app, "POST", "/api/message", r#"{"action":"deleteEverything"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn test_capabilities_route() {
        let (coordinator, _tmp) =
            coordinator_with(ScriptedAi::default(), StaticPage::html("")).await;
        let app = router(Arc::new(coordinator));

        let (status, value) = call(app, "GET", "/api/capabilities", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["canPrompt"], false);
    }
}
