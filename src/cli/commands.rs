use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Local;

use crate::{
    app::{
        message::{Request, TabRef},
        AppFactory, Messenger,
    },
    cli::{
        errors::{CliError, CliResult},
        validation::*,
        Command,
    },
    config::Config,
    knowledge::KnowledgeEntry,
    surface::{self, panel, popup, SAVED_INDICATOR},
    web,
};

/// Entry point for every subcommand.
pub async fn run(command: Command) -> anyhow::Result<()> {
    let base_path = AppFactory::get_base_path()?;
    let config = AppFactory::load_config(&base_path)?;

    if let Command::Daemon { listen } = command {
        return daemon(&config, &base_path, listen).await;
    }

    let messenger = AppFactory::create_messenger(&config, &base_path).await?;
    execute(command, messenger, &config).await?;
    Ok(())
}

async fn daemon(config: &Config, base_path: &str, listen: Option<String>) -> anyhow::Result<()> {
    let addr: SocketAddr = match listen {
        Some(listen) => listen
            .parse()
            .with_context(|| format!("invalid listen address {listen:?}"))?,
        None => config.listen_addr()?,
    };

    let coordinator = AppFactory::create_coordinator(config, base_path).await?;
    web::serve(Arc::new(coordinator), addr).await
}

async fn execute(
    command: Command,
    messenger: Arc<dyn Messenger>,
    config: &Config,
) -> CliResult<()> {
    match command {
        Command::Daemon { .. } => Ok(()),

        Command::Save {
            url,
            title,
            selection,
        } => {
            let entry = SaveCommand::new(url, title, selection)?
                .execute(messenger.as_ref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            println!("{SAVED_INDICATOR}");
            Ok(())
        }

        Command::Search { query, count } => {
            let response = messenger
                .send(Request::SearchKnowledge { query })
                .await?
                .into_search()?;

            if response.error.is_some() {
                return Err(CliError::failed(response.error, "Search failed"));
            }

            if let Some(message) = response.message {
                println!("{message}");
                return Ok(());
            }

            if count {
                println!("{} entries found", response.results.len());
                return Ok(());
            }

            println!("{}", serde_json::to_string_pretty(&response.results)?);
            Ok(())
        }

        Command::List { window } => {
            let entries = all_pages(messenger.as_ref()).await?;
            let shown = window.apply(&entries, &Local::now());
            println!("{}", serde_json::to_string_pretty(&shown)?);
            Ok(())
        }

        Command::Stats {} => {
            let entries = all_pages(messenger.as_ref()).await?;
            let stats = panel::Stats::compute(&entries, &Local::now());
            println!(
                "Total: {}\nToday: {}\nThis week: {}",
                stats.total, stats.today, stats.this_week
            );
            Ok(())
        }

        Command::Rewrite { text } => {
            validate_non_empty("text", &text)?;

            let response = messenger
                .send(Request::RewriteNote { text })
                .await?
                .into_rewrite()?;

            match response.text {
                Some(text) if response.success => {
                    println!("{text}");
                    Ok(())
                }
                _ => Err(CliError::failed(response.error, "Rewrite failed")),
            }
        }

        Command::Capabilities {} => {
            let flags = messenger
                .send(Request::GetCapabilities)
                .await?
                .into_capabilities()?;
            println!("{}", serde_json::to_string_pretty(&flags)?);
            Ok(())
        }

        Command::Popup {} => {
            let mut popup = popup::Popup::open(messenger).await?;
            let delay = Duration::from_millis(config.surface.popup_debounce_ms);
            surface::drive(&mut popup, delay).await?;
            Ok(())
        }

        Command::Panel { window } => {
            let mut panel = panel::Panel::open(messenger, window).await?;
            let delay = Duration::from_millis(config.surface.panel_debounce_ms);
            surface::drive(&mut panel, delay).await?;
            Ok(())
        }

        Command::Open { id } => {
            let entry = find_entry(messenger.as_ref(), &id).await?;
            surface::open_url(&entry.url)?;
            Ok(())
        }
    }
}

async fn all_pages(messenger: &dyn Messenger) -> CliResult<Vec<KnowledgeEntry>> {
    let response = messenger.send(Request::GetAllPages).await?.into_search()?;
    if response.error.is_some() {
        return Err(CliError::failed(response.error, "Failed to load saved pages"));
    }
    Ok(response.results)
}

async fn find_entry(messenger: &dyn Messenger, id: &str) -> CliResult<KnowledgeEntry> {
    all_pages(messenger)
        .await?
        .into_iter()
        .find(|entry| entry.id.as_str() == id)
        .ok_or_else(|| CliError::NotFound { id: id.to_string() })
}

/// Command for saving a page or a selection
#[derive(Debug, Clone)]
pub struct SaveCommand {
    pub tab: TabRef,
    pub selection: Option<String>,
}

impl SaveCommand {
    pub fn new(url: String, title: Option<String>, selection: Option<String>) -> CliResult<Self> {
        validate_url(&url)?;

        Ok(Self {
            tab: TabRef {
                id: None,
                title,
                url,
            },
            selection,
        })
    }

    pub async fn execute(self, messenger: &dyn Messenger) -> CliResult<KnowledgeEntry> {
        let response = messenger
            .send(Request::SavePage {
                tab: self.tab,
                selection: self.selection,
            })
            .await?
            .into_save()?;

        match response.entry {
            Some(entry) if response.success => Ok(entry),
            _ => Err(CliError::failed(response.error, "Save failed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::messenger::LocalMessenger;
    use crate::tests::{coordinator_with, ScriptedAi, StaticPage};

    async fn messenger(page: StaticPage) -> (Arc<dyn Messenger>, tempfile::TempDir) {
        let (coordinator, tmp) = coordinator_with(ScriptedAi::default(), page).await;
        (Arc::new(LocalMessenger::new(Arc::new(coordinator))), tmp)
    }

    #[test]
    fn test_save_command_validates_input() {
        assert!(SaveCommand::new("ftp://example.com".into(), None, None).is_err());
        assert!(SaveCommand::new("https://example.com".into(), None, Some("text".into())).is_ok());
    }

    #[tokio::test]
    async fn test_save_then_find_by_id() {
        let (messenger, _tmp) = messenger(StaticPage::text("page body")).await;

        let entry = SaveCommand::new("https://example.com".into(), Some("Example".into()), None)
            .unwrap()
            .execute(messenger.as_ref())
            .await
            .unwrap();
        assert_eq!(entry.title, "Example");

        let found = find_entry(messenger.as_ref(), &entry.id).await.unwrap();
        assert_eq!(found, entry);

        let missing = find_entry(messenger.as_ref(), "01ARZ3NDEKTSV4RRFFQ69G5FAV").await;
        assert!(matches!(missing, Err(CliError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_long_selection_is_saved_truncated() {
        let (messenger, _tmp) = messenger(StaticPage::failing(500)).await;
        let selection = "word ".repeat(30_000);

        let entry = SaveCommand::new("https://example.com".into(), None, Some(selection))
            .unwrap()
            .execute(messenger.as_ref())
            .await
            .unwrap();
        assert!(entry.is_selection);
        assert_eq!(entry.full_text.chars().count(), 10_000);
    }

    #[tokio::test]
    async fn test_failed_save_surfaces_error() {
        let (messenger, _tmp) = messenger(StaticPage::failing(503)).await;

        let err = SaveCommand::new("https://example.com".into(), None, None)
            .unwrap()
            .execute(messenger.as_ref())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "page fetch failed with status 503");
    }

    #[tokio::test]
    async fn test_rewrite_without_capability_fails() {
        let (messenger, _tmp) = messenger(StaticPage::html("")).await;
        let config = Config::default();

        let err = execute(Command::Rewrite { text: "hi".into() }, messenger, &config)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Rewriter not available");
    }
}
