use async_trait::async_trait;
use serde::Deserialize;

use super::{
    errors::AppError,
    message::{Request, Response},
    messenger::Messenger,
};

/// Sends messages to a running `maarifa daemon`.
pub struct RemoteMessenger {
    remote_addr: String,
    client: reqwest::Client,
}

impl RemoteMessenger {
    pub fn new(addr: &str) -> RemoteMessenger {
        let remote_addr = addr.strip_suffix('/').unwrap_or(addr).to_string();

        RemoteMessenger {
            remote_addr,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Messenger for RemoteMessenger {
    async fn send(&self, request: Request) -> Result<Response, AppError> {
        let url = format!("{}/api/message", self.remote_addr);
        log::debug!("{url} <- {}", request.action());

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // daemon errors look like {"error": "..."}
            let error = serde_json::from_str::<DaemonError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(AppError::Other(anyhow::anyhow!("daemon returned {status}: {error}")));
        }

        let value = serde_json::from_str::<serde_json::Value>(&text).map_err(|err| {
            log::error!("{err}. tried to parse: {text:?}");
            err
        })?;

        Response::decode(&request, value)
    }
}

#[derive(Deserialize)]
struct DaemonError {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::message::TabRef;
    use crate::tests::{coordinator_with, ScriptedAi, StaticPage};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::sync::Arc;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/")
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        let messenger = RemoteMessenger::new("http://localhost:8080/");
        assert_eq!(messenger.remote_addr, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_round_trip_through_daemon() {
        let (coordinator, _tmp) =
            coordinator_with(ScriptedAi::default(), StaticPage::text("remote body")).await;
        let addr = spawn_server(crate::web::router(Arc::new(coordinator))).await;
        let messenger = RemoteMessenger::new(&addr);

        let flags = messenger
            .send(Request::GetCapabilities)
            .await
            .unwrap()
            .into_capabilities()
            .unwrap();
        assert!(!flags.can_summarize);

        let saved = messenger
            .send(Request::SavePage {
                tab: TabRef {
                    id: Some(7),
                    title: Some("Remote".into()),
                    url: "https://example.com/remote".into(),
                },
                selection: None,
            })
            .await
            .unwrap()
            .into_save()
            .unwrap();
        assert!(saved.success);
        assert_eq!(saved.entry.unwrap().full_text, "remote body");

        let found = messenger
            .send(Request::SearchKnowledge {
                query: "remote".into(),
            })
            .await
            .unwrap()
            .into_search()
            .unwrap();
        assert_eq!(found.results.len(), 1);
        assert_eq!(found.results[0].title, "Remote");
    }

    #[tokio::test]
    async fn test_daemon_error_status_is_reported() {
        let app = Router::new().route(
            "/api/message",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "unknown action"})),
                )
            }),
        );
        let messenger = RemoteMessenger::new(&spawn_server(app).await);

        let err = messenger.send(Request::GetAllPages).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("daemon returned 400"), "{message}");
        assert!(message.contains("unknown action"), "{message}");
    }
}
