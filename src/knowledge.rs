use crate::{
    app::AppError,
    eid::EntryId,
    lock::StoreLock,
    storage::StorageManager,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Storage key holding the whole collection.
pub const STORAGE_KEY: &str = "knowledgeBase";

/// Appended to every truncated fallback summary.
pub const ELLIPSIS: &str = "...";

/// One saved page or selection. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: EntryId,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub full_text: String,
    pub saved_at: DateTime<Utc>,
    /// Reserved. Nothing assigns tags yet.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_selection: bool,
}

/// Prefix of `text` holding at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Summary used when the summarizer is unavailable or failed.
pub fn fallback_summary(text: &str, max: usize) -> String {
    format!("{}{ELLIPSIS}", truncate_chars(text, max))
}

/// Case-insensitive substring match of the whole query against title,
/// summary and full text. Keeps the input order.
pub fn keyword_filter(entries: &[KnowledgeEntry], query: &str) -> Vec<KnowledgeEntry> {
    let query = query.to_lowercase();

    entries
        .iter()
        .filter(|entry| {
            entry.title.to_lowercase().contains(&query)
                || entry.summary.to_lowercase().contains(&query)
                || entry.full_text.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// The persisted collection, newest entry first.
///
/// Writers are serialized twice: an async mutex orders writers inside this
/// process and [`StoreLock`] orders them across processes sharing the
/// directory.
pub struct KnowledgeBase {
    store: Arc<dyn StorageManager>,
    write_lock: tokio::sync::Mutex<()>,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn StorageManager>) -> Self {
        Self {
            store,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn all(&self) -> Result<Vec<KnowledgeEntry>, AppError> {
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || read_entries(store.as_ref()))
            .await
            .map_err(|err| AppError::Other(anyhow::anyhow!("read task failed: {err}")))?
    }

    /// Puts `entry` in front of the stored collection and returns the new length.
    pub async fn prepend(&self, entry: KnowledgeEntry) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || {
            let _lock = StoreLock::acquire(store.dir())?;

            let mut entries = read_entries(store.as_ref())?;
            entries.insert(0, entry);
            store.set(STORAGE_KEY, &serde_json::to_vec(&entries)?)?;

            Ok::<_, AppError>(entries.len())
        })
        .await
        .map_err(|err| AppError::Other(anyhow::anyhow!("write task failed: {err}")))?
    }
}

fn read_entries(store: &dyn StorageManager) -> Result<Vec<KnowledgeEntry>, AppError> {
    let now = Instant::now();

    let entries = match store.get(STORAGE_KEY)? {
        Some(data) => serde_json::from_slice(&data)?,
        None => vec![],
    };

    log::debug!(
        "took {}ms to read knowledge base",
        now.elapsed().as_micros() as f64 / 1000.0
    );

    Ok(entries)
}
