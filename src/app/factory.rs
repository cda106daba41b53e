use crate::{
    ai::{AiProvider, DisabledProvider, OpenAiCompatProvider},
    app::{
        coordinator::Coordinator,
        messenger::{LocalMessenger, Messenger},
        remote::RemoteMessenger,
    },
    config::Config,
    extract::HttpPageFetcher,
    knowledge::KnowledgeBase,
    storage,
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::sync::Arc;

/// Builds coordinators and messengers from the environment and config.
pub struct AppFactory;

impl AppFactory {
    /// Base directory for config and data: `MAARIFA_BASE_PATH`, or
    /// `~/.local/share/maarifa`.
    pub fn get_base_path() -> Result<String> {
        if let Ok(base_path) = std::env::var("MAARIFA_BASE_PATH") {
            return Ok(base_path);
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;

        Ok(format!("{}/.local/share/maarifa", home.to_string_lossy()))
    }

    pub fn load_config(base_path: &str) -> Result<Config> {
        std::fs::create_dir_all(base_path)
            .context("Failed to create application base directory")?;
        Config::load_with(base_path)
    }

    pub fn create_ai_provider(config: &Config) -> Result<Arc<dyn AiProvider>> {
        if !config.ai.enabled {
            log::info!("AI disabled, using local fallbacks only");
            return Ok(Arc::new(DisabledProvider));
        }

        log::info!("AI endpoint {} with model {}", config.ai.endpoint, config.ai.model);
        Ok(Arc::new(OpenAiCompatProvider::new(&config.ai)?))
    }

    /// Coordinator over the knowledge base in `base_path`, capabilities probed.
    pub async fn create_coordinator(config: &Config, base_path: &str) -> Result<Coordinator> {
        let store = storage::BackendLocal::new(base_path)
            .context("Failed to open knowledge storage")?;
        let fetcher = HttpPageFetcher::new(&config.fetch)?;
        let ai = Self::create_ai_provider(config)?;

        Ok(Coordinator::start(
            ai,
            Arc::new(fetcher),
            KnowledgeBase::new(Arc::new(store)),
            config.limits.clone(),
        )
        .await)
    }

    /// Talks to the daemon at `MAARIFA_ADDR` when set, otherwise runs the
    /// coordinator in-process.
    pub async fn create_messenger(config: &Config, base_path: &str) -> Result<Arc<dyn Messenger>> {
        match remote_addr() {
            Some(addr) => {
                log::info!("Using remote daemon: {addr}");
                Ok(Arc::new(RemoteMessenger::new(&addr)))
            }
            None => {
                let coordinator = Self::create_coordinator(config, base_path).await?;
                Ok(Arc::new(LocalMessenger::new(Arc::new(coordinator))))
            }
        }
    }
}

fn remote_addr() -> Option<String> {
    std::env::var("MAARIFA_ADDR")
        .ok()
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CapabilityFlags;

    #[tokio::test]
    async fn test_disabled_ai_yields_no_capabilities() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();

        let config = AppFactory::load_config(base).unwrap();
        let coordinator = AppFactory::create_coordinator(&config, base).await.unwrap();

        assert_eq!(coordinator.get_capabilities(), CapabilityFlags::default());
        assert!(coordinator.get_all_pages().await.results.is_empty());
    }
}
