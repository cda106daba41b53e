//! Debounced search box.
//!
//! Keystrokes arrive as [`Input`]s; a search fires once the text has been
//! stable for `delay`, or right away on Enter. Clearing the box fires
//! [`Trigger::Cleared`] immediately and drops any pending search.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Changed(String),
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Search(String),
    Cleared,
}

/// Starts the debouncer task. It stops once the input sender is dropped.
pub fn spawn(delay: Duration) -> (mpsc::UnboundedSender<Input>, mpsc::UnboundedReceiver<Trigger>) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

    tokio::spawn(run(delay, input_rx, trigger_tx));

    (input_tx, trigger_rx)
}

async fn run(
    delay: Duration,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    triggers: mpsc::UnboundedSender<Trigger>,
) {
    let mut query = String::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let timer = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        let fired = tokio::select! {
            input = inputs.recv() => match input {
                None => break,
                Some(Input::Changed(text)) => {
                    query = text.trim().to_string();
                    if query.is_empty() {
                        deadline = None;
                        Some(Trigger::Cleared)
                    } else {
                        deadline = Some(Instant::now() + delay);
                        None
                    }
                }
                Some(Input::Enter) => {
                    deadline = None;
                    (!query.is_empty()).then(|| Trigger::Search(query.clone()))
                }
            },
            _ = timer => {
                deadline = None;
                Some(Trigger::Search(query.clone()))
            }
        };

        if let Some(trigger) = fired {
            if triggers.send(trigger).is_err() {
                break;
            }
        }
    }
}
