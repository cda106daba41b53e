//! Side panel: the whole collection as cards, narrowed by a time window.
//!
//! Windows are applied to the already loaded collection; switching between
//! them never sends a request.

use std::fmt::{Display, Write as _};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Months, TimeZone, Utc};

use crate::{
    app::{
        message::{Request, SaveResponse, TabRef},
        Messenger,
    },
    knowledge::KnowledgeEntry,
};

use super::{
    debounce::Trigger, open_url, save_button::SaveButton, Interactive, Line, SAVED_INDICATOR,
};

pub const EMPTY_STATE: &str =
    "No knowledge found\nStart saving pages to build your knowledge base!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TimeWindow {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TimeWindow::Today => "Today",
            TimeWindow::Week => "This week",
            TimeWindow::Month => "This month",
            TimeWindow::All => "All",
        };
        write!(f, "{label}")
    }
}

impl TimeWindow {
    /// `Today` compares calendar dates in `now`'s timezone, `Week` and
    /// `Month` reach back seven days and one calendar month from `now`.
    pub fn contains<Tz: TimeZone>(&self, saved_at: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        match self {
            TimeWindow::Today => {
                saved_at.with_timezone(&now.timezone()).date_naive() == now.date_naive()
            }
            TimeWindow::Week => *saved_at >= now.with_timezone(&Utc) - Duration::days(7),
            TimeWindow::Month => now
                .with_timezone(&Utc)
                .checked_sub_months(Months::new(1))
                .map_or(true, |cutoff| *saved_at >= cutoff),
            TimeWindow::All => true,
        }
    }

    pub fn apply<Tz: TimeZone>(
        &self,
        entries: &[KnowledgeEntry],
        now: &DateTime<Tz>,
    ) -> Vec<KnowledgeEntry> {
        entries
            .iter()
            .filter(|entry| self.contains(&entry.saved_at, now))
            .cloned()
            .collect()
    }
}

/// Counters shown above the cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
}

impl Stats {
    pub fn compute<Tz: TimeZone>(entries: &[KnowledgeEntry], now: &DateTime<Tz>) -> Self {
        let count = |window: TimeWindow| {
            entries
                .iter()
                .filter(|entry| window.contains(&entry.saved_at, now))
                .count()
        };

        Self {
            total: entries.len(),
            today: count(TimeWindow::Today),
            this_week: count(TimeWindow::Week),
        }
    }
}

const INTERVALS: [(&str, i64); 6] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
];

/// "3 hours ago", "1 week ago", or "Just now" under a minute.
pub fn time_ago(saved_at: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let seconds = (*now - *saved_at).num_seconds();

    for (unit, unit_seconds) in INTERVALS {
        let count = seconds / unit_seconds;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{count} {unit}{plural} ago");
        }
    }

    "Just now".to_string()
}

pub fn render_card<Tz>(position: usize, entry: &KnowledgeEntry, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = entry.saved_at.with_timezone(&now.timezone());

    format!(
        "[{position}] {}\n    {}\n    📅 {}  {}\n",
        entry.title,
        entry.summary,
        date.format("%Y-%m-%d"),
        time_ago(&entry.saved_at, &now.with_timezone(&Utc)),
    )
}

pub struct Panel {
    messenger: Arc<dyn Messenger>,
    entries: Vec<KnowledgeEntry>,
    shown: Vec<KnowledgeEntry>,
    window: TimeWindow,
    button: SaveButton,
}

impl Panel {
    pub async fn open(messenger: Arc<dyn Messenger>, window: TimeWindow) -> anyhow::Result<Self> {
        let mut panel = Self {
            messenger,
            entries: vec![],
            shown: vec![],
            window,
            button: SaveButton::default(),
        };
        panel.reload().await?;
        Ok(panel)
    }

    pub async fn reload(&mut self) -> anyhow::Result<()> {
        let response = self.messenger.send(Request::GetAllPages).await?.into_search()?;
        if let Some(err) = response.error {
            anyhow::bail!("Failed to load knowledge: {err}");
        }

        self.entries = response.results;
        self.apply_window();
        Ok(())
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
        self.apply_window();
    }

    fn apply_window(&mut self) {
        self.shown = self.window.apply(&self.entries, &Local::now());
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

        self.shown = response.results;
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
            self.reload().await?;
        }

        Ok(response)
    }

    /// Card at 1-based `position` among those shown.
    pub fn card(&self, position: usize) -> Option<&KnowledgeEntry> {
        position.checked_sub(1).and_then(|idx| self.shown.get(idx))
    }

    #[cfg(test)]
    pub fn shown(&self) -> &[KnowledgeEntry] {
        &self.shown
    }

    pub fn render_at<Tz>(&mut self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let stats = Stats::compute(&self.entries, now);
        let mut out = String::new();

        let _ = writeln!(
            out,
            "MaarifaHub · {}   [{}]\nTotal {} · Today {} · This week {}\n",
            self.window,
            self.button.state().label(),
            stats.total,
            stats.today,
            stats.this_week,
        );

        if self.shown.is_empty() {
            out.push_str(EMPTY_STATE);
            out.push('\n');
            return out;
        }

        for (idx, entry) in self.shown.iter().enumerate() {
            out.push_str(&render_card(idx + 1, entry, now));
        }
        out
    }
}

#[async_trait]
impl Interactive for Panel {
    async fn handle(&mut self, line: Line) -> anyhow::Result<()> {
        match line {
            Line::Window(window) => self.set_window(window),
            Line::Save(url) => match self.save(super::tab_for(&url)).await? {
                Some(response) if response.success => println!("{SAVED_INDICATOR}"),
                Some(response) => println!(
                    "⚠️ {}",
                    response.error.unwrap_or_else(|| "Save failed".to_string())
                ),
                None => println!("Save in progress, try again in a moment"),
            },
            Line::Open(position) => match self.card(position) {
                Some(entry) => open_url(&entry.url)?,
                None => println!("No card {position}"),
            },
            Line::Unknown(line) => {
                println!(
                    "Unknown command {line:?}. \
                     Try /today /week /month /all /save <url> /open <n> /quit"
                )
            }
            Line::Text(_) | Line::Quit => {}
        }
        Ok(())
    }

    async fn trigger(&mut self, trigger: Trigger) -> anyhow::Result<()> {
        match trigger {
            Trigger::Search(query) => self.search(&query).await,
            Trigger::Cleared => {
                self.apply_window();
                Ok(())
            }
        }
    }

    fn render(&mut self) -> String {
        self.render_at(&Local::now())
    }
}
