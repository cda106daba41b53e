use std::fmt::{Display, Write as _};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, TimeZone};

use crate::{
    ai::{Capability, CapabilityFlags},
    app::{
        message::{Request, SaveResponse, TabRef},
        Messenger,
    },
    knowledge::{truncate_chars, KnowledgeEntry, ELLIPSIS},
};

use super::{
    debounce::Trigger, open_url, panel::TimeWindow, save_button::SaveButton, tab_for,
    Interactive, Line, SAVED_INDICATOR,
};

const PREVIEW_CHARS: usize = 120;

/// Compact popup: capability overview, a search box and one row per entry.
pub struct Popup {
    messenger: Arc<dyn Messenger>,
    capabilities: CapabilityFlags,
    results: Vec<KnowledgeEntry>,
    query: String,
    button: SaveButton,
}

pub fn capability_line(flags: &CapabilityFlags) -> String {
    let parts = Capability::ALL
        .iter()
        .map(|capability| {
            let mark = if flags.has(*capability) { "✓" } else { "✗" };
            format!("{capability} {mark}")
        })
        .collect::<Vec<_>>();

    format!("AI: {}", parts.join(" · "))
}

fn preview(summary: &str) -> String {
    let cut = truncate_chars(summary, PREVIEW_CHARS);
    if cut.len() < summary.len() {
        format!("{cut}{ELLIPSIS}")
    } else {
        cut.to_string()
    }
}

pub fn render_row<Tz>(position: usize, entry: &KnowledgeEntry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{position}. {}\n   {}\n   {}\n   📅 {}\n",
        entry.title,
        entry.url,
        preview(&entry.summary),
        entry.saved_at.with_timezone(tz).format("%Y-%m-%d %H:%M"),
    )
}

impl Popup {
    pub async fn open(messenger: Arc<dyn Messenger>) -> anyhow::Result<Self> {
        let capabilities = messenger
            .send(Request::GetCapabilities)
            .await?
            .into_capabilities()?;
        log::info!("AI capabilities: {capabilities:?}");

        let mut popup = Self {
            messenger,
            capabilities,
            results: vec![],
            query: String::new(),
            button: SaveButton::default(),
        };
        popup.load_all().await?;
        Ok(popup)
    }

    pub async fn load_all(&mut self) -> anyhow::Result<()> {
        let response = self.messenger.send(Request::GetAllPages).await?.into_search()?;
        if let Some(err) = response.error {
            anyhow::bail!("Failed to load saved pages: {err}");
        }

        self.query.clear();
        self.results = response.results;
        Ok(())
    }

    pub async fn search(&mut self, query: &str) -> anyhow::Result<()> {
        let response = self
            .messenger
            .send(Request::SearchKnowledge {
                query: query.to_string(),
            })
            .await?
            .into_search()?;

        if let Some(err) = response.error {
            anyhow::bail!("Search failed: {err}");
        }

        self.query = query.to_string();
        self.results = response.results;
        Ok(())
    }

    pub async fn save(&mut self, tab: TabRef) -> anyhow::Result<Option<SaveResponse>> {
        let messenger = self.messenger.clone();

        let response = self
            .button
            .press(move || async move {
                let request = Request::SavePage {
                    tab,
                    selection: None,
                };
                match messenger.send(request).await.and_then(|r| r.into_save()) {
                    Ok(response) => response,
                    Err(err) => SaveResponse::failed(err),
                }
            })
            .await;

        if matches!(response, Some(ref r) if r.success) {
            self.load_all().await?;
        }

        Ok(response)
    }

    #[cfg(test)]
    pub fn results(&self) -> &[KnowledgeEntry] {
        &self.results
    }

    pub fn render_in<Tz>(&mut self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}\n[{}]\n",
            capability_line(&self.capabilities),
            self.button.state().label()
        );

        if self.results.is_empty() {
            if self.query.is_empty() {
                out.push_str("No saved knowledge yet.\nUse /save <url> to get started!\n");
            } else {
                let _ = writeln!(
                    out,
                    "No results found for \"{}\"\nTry a different search term",
                    self.query
                );
            }
            return out;
        }

        for (idx, entry) in self.results.iter().enumerate() {
            out.push_str(&render_row(idx + 1, entry, tz));
        }
        out
    }
}

#[async_trait]
impl Interactive for Popup {
    async fn handle(&mut self, line: Line) -> anyhow::Result<()> {
        match line {
            Line::Window(TimeWindow::All) => self.load_all().await?,
            Line::Window(window) => {
                println!("The {window} filter lives in the side panel (maarifa panel)")
            }
            Line::Save(url) => match self.save(tab_for(&url)).await? {
                Some(response) if response.success => println!("{SAVED_INDICATOR}"),
                Some(response) => println!(
                    "⚠️ {}",
                    response.error.unwrap_or_else(|| "Save failed".to_string())
                ),
                None => println!("Save in progress, try again in a moment"),
            },
            Line::Open(position) => {
                match position.checked_sub(1).and_then(|i| self.results.get(i)) {
                    Some(entry) => open_url(&entry.url)?,
                    None => println!("No result {position}"),
                }
            }
            Line::Unknown(line) => {
                println!("Unknown command {line:?}. Try /all /save <url> /open <n> /quit")
            }
            Line::Text(_) | Line::Quit => {}
        }
        Ok(())
    }

    async fn trigger(&mut self, trigger: Trigger) -> anyhow::Result<()> {
        match trigger {
            Trigger::Search(query) => self.search(&query).await,
            Trigger::Cleared => self.load_all().await,
        }
    }

    fn render(&mut self) -> String {
        self.render_in(&Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Availability;
    use crate::app::messenger::LocalMessenger;
    use crate::tests::{coordinator_with, ScriptedAi, StaticPage};
    use chrono::Utc;

    #[test]
    fn test_capability_line() {
        let flags = CapabilityFlags {
            can_summarize: true,
            can_rewrite: true,
            ..Default::default()
        };
        assert_eq!(
            capability_line(&flags),
            concat!(
                "AI: Summarizer ✓ · Language model ✗ · Writer ✗ · ",
                "Rewriter ✓ · Proofreader ✗ · Translator ✗"
            )
        );
    }

    #[test]
    fn test_preview_cuts_long_summaries() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(200);
        assert_eq!(preview(&long), format!("{}...", "é".repeat(120)));
    }

    #[tokio::test]
    async fn test_popup_search_and_empty_states() {
        let ai = ScriptedAi::default()
            .with(Capability::Prompt, Availability::Readily)
            .ranking(Ok("none"));
        let (coordinator, _tmp) = coordinator_with(ai, StaticPage::text("tokio tasks")).await;
        let messenger: Arc<dyn Messenger> = Arc::new(LocalMessenger::new(Arc::new(coordinator)));

        let mut popup = Popup::open(messenger).await.unwrap();
        assert!(popup.render_in(&Utc).contains("No saved knowledge yet."));
        assert!(popup.render_in(&Utc).contains("Language model ✓"));

        popup.save(tab_for("https://tokio.rs")).await.unwrap();
        assert_eq!(popup.results().len(), 1);
        assert!(popup.render_in(&Utc).contains("1. https://tokio.rs\n   https://tokio.rs\n"));

        popup.trigger(Trigger::Search("tasks".into())).await.unwrap();
        assert!(popup.results().is_empty());
        assert!(popup
            .render_in(&Utc)
            .contains("No results found for \"tasks\""));

        popup.trigger(Trigger::Cleared).await.unwrap();
        assert_eq!(popup.results().len(), 1);
    }
}
