//! Terminal front-ends over a [`Messenger`](crate::app::Messenger).
//!
//! Surfaces hold no state shared with the coordinator. Each one reloads the
//! collection through the messenger after a save.
//!
//! - `debounce`: debounced search box
//! - `save_button`: save button state machine
//! - `popup`: compact list with capability overview
//! - `panel`: cards with time windows and counters

pub mod debounce;
pub mod panel;
pub mod popup;
pub mod save_button;

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::message::TabRef;

use debounce::{Input, Trigger};

/// Printed after a successful save.
pub const SAVED_INDICATOR: &str = "Saved to MaarifaHub";

/// One line typed into an interactive surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Window(panel::TimeWindow),
    Save(String),
    Open(usize),
    Quit,
    Unknown(String),
    Text(String),
}

pub fn parse_line(line: &str) -> Line {
    let line = line.trim();

    let Some(command) = line.strip_prefix('/') else {
        return Line::Text(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match (name, arg) {
        ("today", "") => Line::Window(panel::TimeWindow::Today),
        ("week", "") => Line::Window(panel::TimeWindow::Week),
        ("month", "") => Line::Window(panel::TimeWindow::Month),
        ("all", "") => Line::Window(panel::TimeWindow::All),
        ("quit" | "q", "") => Line::Quit,
        ("save", url) if !url.is_empty() => Line::Save(url.to_string()),
        ("open", n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Line::Open(n),
            _ => Line::Unknown(line.to_string()),
        },
        _ => Line::Unknown(line.to_string()),
    }
}

/// A surface driven line by line from the terminal.
#[async_trait]
pub trait Interactive: Send {
    /// Commands other than plain text and `/quit`.
    async fn handle(&mut self, line: Line) -> anyhow::Result<()>;

    async fn trigger(&mut self, trigger: Trigger) -> anyhow::Result<()>;

    fn render(&mut self) -> String;
}

/// Reads stdin until `/quit` or end of input. Plain text goes through the
/// search box: the line is typed and Enter is pressed.
pub async fn drive<S: Interactive>(surface: &mut S, delay: Duration) -> anyhow::Result<()> {
    let (inputs, mut triggers) = debounce::spawn(delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", surface.render());

    loop {
        let outcome = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Line::Quit => break,
                    Line::Text(text) => {
                        inputs.send(Input::Changed(text))?;
                        inputs.send(Input::Enter)?;
                        continue;
                    }
                    other => surface.handle(other).await,
                }
            }
            Some(trigger) = triggers.recv() => surface.trigger(trigger).await,
        };

        match outcome {
            Ok(()) => println!("{}", surface.render()),
            Err(err) => println!("⚠️ {err}"),
        }
    }

    Ok(())
}

/// Tab for a url typed at the prompt.
pub fn tab_for(url: &str) -> TabRef {
    TabRef {
        id: None,
        title: None,
        url: url.to_string(),
    }
}

fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "start"
    } else {
        "xdg-open"
    }
}

/// Hands `url` to the platform opener.
pub fn open_url(url: &str) -> anyhow::Result<()> {
    let opener = opener();
    log::debug!("opening {url} with {opener}");

    let mut command = if cfg!(windows) {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        std::process::Command::new(opener)
    };

    let status = command
        .arg(url)
        .status()
        .with_context(|| format!("failed to run {opener}"))?;

    if !status.success() {
        bail!("{opener} exited with {status}");
    }

    Ok(())
}
