use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{ai::CapabilityFlags, knowledge::KnowledgeEntry};

use super::errors::AppError;

pub const NO_KNOWLEDGE_MESSAGE: &str = "No saved knowledge yet";

/// Browser tab a save request points at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
}

/// Inbound message, keyed by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetCapabilities,
    SavePage {
        tab: TabRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection: Option<String>,
    },
    SearchKnowledge {
        query: String,
    },
    GetAllPages,
    RewriteNote {
        text: String,
    },
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::GetCapabilities => "getCapabilities",
            Request::SavePage { .. } => "savePage",
            Request::SearchKnowledge { .. } => "searchKnowledge",
            Request::GetAllPages => "getAllPages",
            Request::RewriteNote { .. } => "rewriteNote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<KnowledgeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved(entry: KnowledgeEntry) -> Self {
        Self {
            success: true,
            entry: Some(entry),
            error: None,
        }
    }

    pub fn failed(err: impl Display) -> Self {
        Self {
            success: false,
            entry: None,
            error: Some(err.to_string()),
        }
    }
}

/// Answer to both `searchKnowledge` and `getAllPages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<KnowledgeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn found(results: Vec<KnowledgeEntry>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn empty_base() -> Self {
        Self {
            message: Some(NO_KNOWLEDGE_MESSAGE.to_string()),
            ..Default::default()
        }
    }

    pub fn failed(err: impl Display) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RewriteResponse {
    pub fn rewritten(text: String) -> Self {
        Self {
            success: true,
            text: Some(text),
            error: None,
        }
    }

    pub fn failed(err: impl Display) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(err.to_string()),
        }
    }
}

/// Outbound record. Serialized bare, the caller knows which action it sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Capabilities(CapabilityFlags),
    Save(SaveResponse),
    Search(SearchResponse),
    Rewrite(RewriteResponse),
}

impl Response {
    /// Reads a bare response record back into the variant `request` expects.
    pub fn decode(request: &Request, value: serde_json::Value) -> Result<Self, AppError> {
        Ok(match request {
            Request::GetCapabilities => Response::Capabilities(serde_json::from_value(value)?),
            Request::SavePage { .. } => Response::Save(serde_json::from_value(value)?),
            Request::SearchKnowledge { .. } | Request::GetAllPages => {
                Response::Search(serde_json::from_value(value)?)
            }
            Request::RewriteNote { .. } => Response::Rewrite(serde_json::from_value(value)?),
        })
    }

    pub fn into_capabilities(self) -> Result<CapabilityFlags, AppError> {
        match self {
            Response::Capabilities(flags) => Ok(flags),
            other => Err(mismatch("capabilities", &other)),
        }
    }

    pub fn into_save(self) -> Result<SaveResponse, AppError> {
        match self {
            Response::Save(resp) => Ok(resp),
            other => Err(mismatch("save", &other)),
        }
    }

    pub fn into_search(self) -> Result<SearchResponse, AppError> {
        match self {
            Response::Search(resp) => Ok(resp),
            other => Err(mismatch("search", &other)),
        }
    }

    pub fn into_rewrite(self) -> Result<RewriteResponse, AppError> {
        match self {
            Response::Rewrite(resp) => Ok(resp),
            other => Err(mismatch("rewrite", &other)),
        }
    }
}

fn mismatch(expected: &str, got: &Response) -> AppError {
    AppError::Other(anyhow::anyhow!("expected {expected} response, got {got:?}"))
}
