//! Language model collaborator.
//!
//! The model is reached through [`AiProvider`]. Which capabilities are usable
//! is probed once at startup into an immutable [`CapabilityFlags`] snapshot
//! that every request handler reads.
//!
//! - `openai`: OpenAI-compatible HTTP provider (works against a local ollama)
//! - `search`: semantic search prompt and reply parsing

mod openai;
pub mod search;

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::AppError;

pub use openai::OpenAiCompatProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Summarize,
    Prompt,
    Write,
    Rewrite,
    Proofread,
    Translate,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Summarize,
        Capability::Prompt,
        Capability::Write,
        Capability::Rewrite,
        Capability::Proofread,
        Capability::Translate,
    ];
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Summarize => "Summarizer",
            Capability::Prompt => "Language model",
            Capability::Write => "Writer",
            Capability::Rewrite => "Rewriter",
            Capability::Proofread => "Proofreader",
            Capability::Translate => "Translator",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Readily,
    AfterDownload,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryKind {
    #[serde(rename = "tl;dr")]
    TlDr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFormat {
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryLength {
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeOptions {
    #[serde(rename = "type")]
    pub kind: SummaryKind,
    pub format: SummaryFormat,
    pub length: SummaryLength,
}

impl SummarizeOptions {
    /// Used for every saved page.
    pub const PAGE: SummarizeOptions = SummarizeOptions {
        kind: SummaryKind::TlDr,
        format: SummaryFormat::PlainText,
        length: SummaryLength::Medium,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteTone {
    MoreFormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteLength {
    AsIs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOptions {
    pub tone: RewriteTone,
    pub length: RewriteLength,
}

impl RewriteOptions {
    /// Used for notes.
    pub const NOTE: RewriteOptions = RewriteOptions {
        tone: RewriteTone::MoreFormal,
        length: RewriteLength::AsIs,
    };
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn availability(&self, capability: Capability) -> Availability;

    async fn summarize(&self, text: &str, opts: SummarizeOptions) -> Result<String, AppError>;

    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError>;

    async fn rewrite(&self, text: &str, opts: RewriteOptions) -> Result<String, AppError>;
}

/// Provider used when AI is turned off in the config.
pub struct DisabledProvider;

#[async_trait]
impl AiProvider for DisabledProvider {
    async fn availability(&self, _capability: Capability) -> Availability {
        Availability::No
    }

    async fn summarize(&self, _text: &str, _opts: SummarizeOptions) -> Result<String, AppError> {
        Err(AppError::Unavailable(Capability::Summarize))
    }

    async fn prompt(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, AppError> {
        Err(AppError::Unavailable(Capability::Prompt))
    }

    async fn rewrite(&self, _text: &str, _opts: RewriteOptions) -> Result<String, AppError> {
        Err(AppError::Unavailable(Capability::Rewrite))
    }
}

/// Which capabilities are usable right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityFlags {
    pub can_summarize: bool,
    pub can_prompt: bool,
    pub can_write: bool,
    pub can_rewrite: bool,
    pub can_proofread: bool,
    pub can_translate: bool,
}

impl CapabilityFlags {
    /// Only capabilities reported as `Readily` count; anything that first needs
    /// a model download stays off.
    pub async fn probe(provider: &dyn AiProvider) -> Self {
        let mut flags = Self::default();

        for capability in Capability::ALL {
            let ready = provider.availability(capability).await == Availability::Readily;
            flags.set(capability, ready);
        }

        log::info!("AI capabilities: {flags:?}");
        flags
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Summarize => self.can_summarize,
            Capability::Prompt => self.can_prompt,
            Capability::Write => self.can_write,
            Capability::Rewrite => self.can_rewrite,
            Capability::Proofread => self.can_proofread,
            Capability::Translate => self.can_translate,
        }
    }

    fn set(&mut self, capability: Capability, value: bool) {
        let slot = match capability {
            Capability::Summarize => &mut self.can_summarize,
            Capability::Prompt => &mut self.can_prompt,
            Capability::Write => &mut self.can_write,
            Capability::Rewrite => &mut self.can_rewrite,
            Capability::Proofread => &mut self.can_proofread,
            Capability::Translate => &mut self.can_translate,
        };
        *slot = value;
    }
}
