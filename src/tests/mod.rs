
use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    ai::{AiProvider, Availability, Capability, RewriteOptions, SummarizeOptions},
    app::{AppError, Coordinator},
    config::Limits,
    extract::PageFetcher,
    knowledge::KnowledgeBase,
    storage,
};

/// Model double answering from a script.
#[derive(Clone, Default)]
pub struct ScriptedAi {
    availability: HashMap<Capability, Availability>,
    summary: Option<Result<String, String>>,
    ranking: Option<Result<String, String>>,
    rewrite: Option<Result<String, String>>,
    prompts: Arc<Mutex<Vec<String>>>,
    summarized: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAi {
    pub fn with(mut self, capability: Capability, availability: Availability) -> Self {
        self.availability.insert(capability, availability);
        self
    }

    pub fn ready(self, capability: Capability) -> Self {
        self.with(capability, Availability::Readily)
    }

    pub fn summary(mut self, reply: Result<&str, &str>) -> Self {
        self.summary = Some(reply.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn ranking(mut self, reply: Result<&str, &str>) -> Self {
        self.ranking = Some(reply.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn rewrite_reply(mut self, reply: Result<&str, &str>) -> Self {
        self.rewrite = Some(reply.map(str::to_string).map_err(str::to_string));
        self
    }

    /// User prompts sent so far.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }

    /// Texts handed to the summarizer so far.
    pub fn summarized(&self) -> Arc<Mutex<Vec<String>>> {
        self.summarized.clone()
    }
}

fn scripted(reply: &Option<Result<String, String>>) -> Result<String, AppError> {
    match reply {
        Some(Ok(text)) => Ok(text.clone()),
        Some(Err(err)) => Err(AppError::Ai(err.clone())),
        None => Err(AppError::Ai("no scripted reply".to_string())),
    }
}

#[async_trait]
impl AiProvider for ScriptedAi {
    async fn availability(&self, capability: Capability) -> Availability {
        self.availability
            .get(&capability)
            .copied()
            .unwrap_or(Availability::No)
    }

    async fn summarize(&self, text: &str, _opts: SummarizeOptions) -> Result<String, AppError> {
        self.summarized.lock().unwrap().push(text.to_string());
        scripted(&self.summary)
    }

    async fn prompt(&self, _system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        scripted(&self.ranking)
    }

    async fn rewrite(&self, _text: &str, _opts: RewriteOptions) -> Result<String, AppError> {
        scripted(&self.rewrite)
    }
}

/// Page fetcher serving one fixed document.
#[derive(Clone)]
pub struct StaticPage {
    html: Result<String, u16>,
    fetches: Arc<AtomicUsize>,
}

impl StaticPage {
    pub fn html(html: &str) -> Self {
        Self {
            html: Ok(html.to_string()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::html(&format!("<html><body><article><p>{text}</p></article></body></html>"))
    }

    pub fn failing(status: u16) -> Self {
        Self {
            html: Err(status),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticPage {
    async fn fetch_html(&self, _url: &str) -> Result<String, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.html.clone().map_err(AppError::FetchStatus)
    }
}

/// Coordinator over a knowledge base in `dir`.
pub async fn coordinator_in(dir: &Path, ai: ScriptedAi, page: StaticPage) -> Coordinator {
    let store = storage::BackendLocal::new(dir).expect("failed to create storage");

    Coordinator::start(
        Arc::new(ai),
        Arc::new(page),
        KnowledgeBase::new(Arc::new(store)),
        Limits::default(),
    )
    .await
}

/// Coordinator over a fresh temp directory, dropped with the returned guard.
pub async fn coordinator_with(
    ai: ScriptedAi,
    page: StaticPage,
) -> (Coordinator, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let coordinator = coordinator_in(tmp.path(), ai, page).await;
    (coordinator, tmp)
}
