use std::net::SocketAddr;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::storage::{self, StorageManager};

const CONFIG_KEY: &str = "config.yaml";

/// Characters kept from the source text when no AI summary is available.
const SUMMARY_FALLBACK_CHARS: usize = 500;
/// Upper bound on the stored `fullText`.
const FULL_TEXT_MAX_CHARS: usize = 10_000;
/// Characters handed to the summarizer.
const SUMMARIZE_INPUT_MAX_CHARS: usize = 4_000;
/// Entries shown to the model during semantic search.
const SEMANTIC_CONTEXT_ENTRIES: usize = 10;

const DEFAULT_AI_ENDPOINT: &str = "http://localhost:11434/v1";
const DEFAULT_AI_MODEL: &str = "llama3.2";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

const POPUP_DEBOUNCE_MS: u64 = 500;
const PANEL_DEBOUNCE_MS: u64 = 300;

/// Truncation bounds applied when saving and searching.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Limits {
    #[serde(default = "summary_fallback_chars")]
    pub summary_fallback_chars: usize,
    #[serde(default = "full_text_max_chars")]
    pub full_text_max_chars: usize,
    #[serde(default = "summarize_input_max_chars")]
    pub summarize_input_max_chars: usize,
    #[serde(default = "semantic_context_entries")]
    pub semantic_context_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            summary_fallback_chars: SUMMARY_FALLBACK_CHARS,
            full_text_max_chars: FULL_TEXT_MAX_CHARS,
            summarize_input_max_chars: SUMMARIZE_INPUT_MAX_CHARS,
            semantic_context_entries: SEMANTIC_CONTEXT_ENTRIES,
        }
    }
}

fn summary_fallback_chars() -> usize {
    SUMMARY_FALLBACK_CHARS
}

fn full_text_max_chars() -> usize {
    FULL_TEXT_MAX_CHARS
}

fn summarize_input_max_chars() -> usize {
    SUMMARIZE_INPUT_MAX_CHARS
}

fn semantic_context_entries() -> usize {
    SEMANTIC_CONTEXT_ENTRIES
}

/// Language model endpoint used for summaries, semantic search and rewrites
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiConfig {
    /// Disabled means every AI capability is reported unavailable
    #[serde(default)]
    pub enabled: bool,

    /// Base url of an OpenAI-compatible API (e.g. a local ollama)
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_AI_ENDPOINT.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

fn default_ai_endpoint() -> String {
    DEFAULT_AI_ENDPOINT.to_string()
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

fn default_ai_timeout_secs() -> u64 {
    DEFAULT_AI_TIMEOUT_SECS
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default = "popup_debounce_ms")]
    pub popup_debounce_ms: u64,
    #[serde(default = "panel_debounce_ms")]
    pub panel_debounce_ms: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            popup_debounce_ms: POPUP_DEBOUNCE_MS,
            panel_debounce_ms: PANEL_DEBOUNCE_MS,
        }
    }
}

fn popup_debounce_ms() -> u64 {
    POPUP_DEBOUNCE_MS
}

fn panel_debounce_ms() -> u64 {
    PANEL_DEBOUNCE_MS
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        let limits = &self.limits;
        if limits.summary_fallback_chars == 0 {
            bail!("limits.summary_fallback_chars must be greater than 0");
        }
        if limits.full_text_max_chars == 0 {
            bail!("limits.full_text_max_chars must be greater than 0");
        }
        if limits.summarize_input_max_chars == 0 {
            bail!("limits.summarize_input_max_chars must be greater than 0");
        }
        if limits.semantic_context_entries == 0 {
            bail!("limits.semantic_context_entries must be greater than 0");
        }

        if self.ai.enabled {
            if self.ai.endpoint.trim().is_empty() {
                bail!("ai.endpoint must be set when ai is enabled");
            }
            if self.ai.model.trim().is_empty() {
                bail!("ai.model must be set when ai is enabled");
            }
        }

        if self.ai.timeout_secs == 0 {
            bail!("ai.timeout_secs must be greater than 0");
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be greater than 0");
        }

        self.listen_addr()?;

        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.daemon
            .listen
            .parse()
            .with_context(|| {
                format!("daemon.listen is not a socket address: {:?}", self.daemon.listen)
            })
    }

    /// Loads `config.yaml` from `base_path`, writing defaults on first run.
    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        let store = storage::BackendLocal::new(base_path)?;

        let config_str = match store.get(CONFIG_KEY)? {
            Some(data) => String::from_utf8(data).context("config file is not valid utf8")?,
            None => {
                log::info!("writing default config to {base_path}");
                let config_str = serde_yml::to_string(&Self::default())?;
                store.set(CONFIG_KEY, config_str.as_bytes())?;
                config_str
            }
        };

        let config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;
        config.validate()?;

        // resave so newly added fields show up with their defaults
        let normalized = serde_yml::to_string(&config)?;
        if config_str != normalized {
            store.set(CONFIG_KEY, normalized.as_bytes())?;
        }

        Ok(config)
    }
}
