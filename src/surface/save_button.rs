use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::app::message::SaveResponse;

/// How long the outcome label stays up before the button is usable again.
pub const REVERT_AFTER: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Saving,
    Saved,
    Failed,
}

impl ButtonState {
    pub fn label(&self) -> &'static str {
        match self {
            ButtonState::Idle => "💾 Save This Page",
            ButtonState::Saving => "💾 Saving...",
            ButtonState::Saved => "✅ Saved!",
            ButtonState::Failed => "❌ Error",
        }
    }
}

/// `Idle -> Saving -> Saved | Failed -> Idle`. Disabled outside `Idle`.
#[derive(Debug)]
pub struct SaveButton {
    state: ButtonState,
    revert_at: Option<Instant>,
}

impl Default for SaveButton {
    fn default() -> Self {
        Self {
            state: ButtonState::Idle,
            revert_at: None,
        }
    }
}

impl SaveButton {
    pub fn state(&mut self) -> ButtonState {
        if let Some(at) = self.revert_at {
            if Instant::now() >= at {
                self.state = ButtonState::Idle;
                self.revert_at = None;
            }
        }
        self.state
    }

    pub fn is_enabled(&mut self) -> bool {
        self.state() == ButtonState::Idle
    }

    /// Runs `save` unless the button is disabled. `None` means the press
    /// was ignored.
    pub async fn press<F, Fut>(&mut self, save: F) -> Option<SaveResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SaveResponse>,
    {
        if !self.is_enabled() {
            log::debug!("save button pressed while {:?}", self.state);
            return None;
        }

        self.state = ButtonState::Saving;
        let response = save().await;

        self.state = if response.success {
            ButtonState::Saved
        } else {
            ButtonState::Failed
        };
        self.revert_at = Some(Instant::now() + REVERT_AFTER);

        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved() -> SaveResponse {
        SaveResponse {
            success: true,
            entry: None,
            error: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_reverts_after_two_seconds() {
        let mut button = SaveButton::default();
        assert_eq!(button.state().label(), "💾 Save This Page");

        let response = button
            .press(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                saved()
            })
            .await;
        assert!(response.unwrap().success);
        assert_eq!(button.state(), ButtonState::Saved);

        // disabled until the revert
        assert!(button.press(|| async { SaveResponse::failed("x") }).await.is_none());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(button.state(), ButtonState::Saved);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(button.state(), ButtonState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_shows_error_then_reverts() {
        let mut button = SaveButton::default();

        let response = button.press(|| async { SaveResponse::failed("offline") }).await;
        assert_eq!(response.unwrap().error.as_deref(), Some("offline"));
        assert_eq!(button.state(), ButtonState::Failed);
        assert_eq!(button.state().label(), "❌ Error");

        tokio::time::sleep(REVERT_AFTER).await;
        assert!(button.is_enabled());
    }
}
