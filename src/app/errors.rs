use crate::ai::Capability;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0} not available")]
    Unavailable(Capability),

    #[error("model error: {0}")]
    Ai(String),

    #[error("invalid page url {0:?}")]
    InvalidUrl(String),

    #[error("page fetch failed with status {0}")]
    FetchStatus(u16),

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
