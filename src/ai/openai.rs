use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{
    AiProvider, Availability, Capability, RewriteLength, RewriteOptions, RewriteTone,
    SummarizeOptions, SummaryFormat, SummaryKind, SummaryLength,
};
use crate::{app::AppError, config::AiConfig};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    id: String,
}

/// Talks to an OpenAI-compatible `chat/completions` endpoint.
///
/// Every operation runs in its own short-lived session: one request carrying
/// its own system prompt, closed once the reply is read.
pub struct OpenAiCompatProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
    model_state: OnceCell<Availability>,
}

impl OpenAiCompatProvider {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            client,
            model_state: OnceCell::new(),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn probe_model(&self) -> Availability {
        let url = format!("{}/models", self.endpoint);

        let response = match self.request(self.client.get(&url)).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::warn!("model listing at {url} returned {}", response.status());
                return Availability::No;
            }
            Err(err) => {
                log::warn!("model endpoint {url} unreachable: {err}");
                return Availability::No;
            }
        };

        match response.json::<ModelList>().await {
            Ok(list) if list.data.iter().any(|m| self.matches_model(&m.id)) => {
                Availability::Readily
            }
            Ok(_) => {
                log::warn!("model {} is not pulled yet", self.model);
                Availability::AfterDownload
            }
            Err(err) => {
                log::warn!("unreadable model listing: {err}");
                Availability::No
            }
        }
    }

    /// ollama lists `llama3.2:latest` for a configured `llama3.2`
    fn matches_model(&self, id: &str) -> bool {
        id == self.model || id.strip_suffix(":latest") == Some(self.model.as_str())
    }

    async fn session(
        &self,
        capability: Capability,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AppError> {
        let session_id = rusty_ulid::generate_ulid_string();
        log::debug!("{capability} session {session_id} created");

        let result = self.complete(system_prompt, user_prompt).await;

        log::debug!("{capability} session {session_id} destroyed");
        result
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self.request(self.client.post(&url)).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Ai(format!("{status}: {text}")));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AppError::Ai("reply has no choices".to_string()))
    }
}

fn summarize_instructions(opts: SummarizeOptions) -> String {
    let kind = match opts.kind {
        SummaryKind::TlDr => "Write a tl;dr of the text the user sends.",
    };
    let length = match opts.length {
        SummaryLength::Medium => "Keep it to one short paragraph.",
    };
    let format = match opts.format {
        SummaryFormat::PlainText => "Answer in plain text without markdown.",
    };

    format!("{kind} {length} {format} Reply with the summary only.")
}

fn rewrite_instructions(opts: RewriteOptions) -> String {
    let tone = match opts.tone {
        RewriteTone::MoreFormal => "Rewrite the text the user sends in a more formal tone.",
    };
    let length = match opts.length {
        RewriteLength::AsIs => "Keep roughly the same length.",
    };

    format!("{tone} {length} Reply with the rewritten text only.")
}

#[async_trait]
impl AiProvider for OpenAiCompatProvider {
    async fn availability(&self, capability: Capability) -> Availability {
        match capability {
            Capability::Summarize
            | Capability::Prompt
            | Capability::Write
            | Capability::Rewrite => *self.model_state.get_or_init(|| self.probe_model()).await,
            // nothing in maarifa proofreads or translates
            Capability::Proofread | Capability::Translate => Availability::No,
        }
    }

    async fn summarize(&self, text: &str, opts: SummarizeOptions) -> Result<String, AppError> {
        self.session(Capability::Summarize, &summarize_instructions(opts), text)
            .await
    }

    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        self.session(Capability::Prompt, system_prompt, user_prompt).await
    }

    async fn rewrite(&self, text: &str, opts: RewriteOptions) -> Result<String, AppError> {
        self.session(Capability::Rewrite, &rewrite_instructions(opts), text)
            .await
    }
}
