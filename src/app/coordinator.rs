//! Background coordinator.
//!
//! Every inbound message is handled here to completion, model calls
//! included, before its response goes out. No handler returns an error:
//! failures become `{success: false, error}` records, and a failing model
//! degrades to truncation or keyword search.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    ai::{search, AiProvider, Capability, CapabilityFlags, RewriteOptions, SummarizeOptions},
    config::Limits,
    eid::EntryId,
    extract::{extract_page_content, PageFetcher},
    knowledge::{fallback_summary, keyword_filter, truncate_chars, KnowledgeBase, KnowledgeEntry},
};

use super::{
    errors::AppError,
    message::{RewriteResponse, Request, Response, SaveResponse, SearchResponse, TabRef},
};

pub struct Coordinator {
    capabilities: CapabilityFlags,
    ai: Arc<dyn AiProvider>,
    fetcher: Arc<dyn PageFetcher>,
    knowledge: KnowledgeBase,
    limits: Limits,
}

impl Coordinator {
    pub fn new(
        capabilities: CapabilityFlags,
        ai: Arc<dyn AiProvider>,
        fetcher: Arc<dyn PageFetcher>,
        knowledge: KnowledgeBase,
        limits: Limits,
    ) -> Self {
        Self {
            capabilities,
            ai,
            fetcher,
            knowledge,
            limits,
        }
    }

    /// Probes the provider once and keeps the result for the coordinator's lifetime.
    pub async fn start(
        ai: Arc<dyn AiProvider>,
        fetcher: Arc<dyn PageFetcher>,
        knowledge: KnowledgeBase,
        limits: Limits,
    ) -> Self {
        let capabilities = CapabilityFlags::probe(ai.as_ref()).await;
        Self::new(capabilities, ai, fetcher, knowledge, limits)
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        log::debug!("handling {}", request.action());

        match request {
            Request::GetCapabilities => Response::Capabilities(self.get_capabilities()),
            Request::SavePage { tab, selection } => {
                Response::Save(self.save_page(&tab, selection.as_deref()).await)
            }
            Request::SearchKnowledge { query } => {
                Response::Search(self.search_knowledge(&query).await)
            }
            Request::GetAllPages => Response::Search(self.get_all_pages().await),
            Request::RewriteNote { text } => Response::Rewrite(self.rewrite_note(&text).await),
        }
    }

    pub fn get_capabilities(&self) -> CapabilityFlags {
        self.capabilities
    }

    pub async fn save_page(&self, tab: &TabRef, selection: Option<&str>) -> SaveResponse {
        match self.try_save_page(tab, selection).await {
            Ok(entry) => SaveResponse::saved(entry),
            Err(err) => {
                log::error!("error saving {}: {err}", tab.url);
                SaveResponse::failed(err)
            }
        }
    }

    async fn try_save_page(
        &self,
        tab: &TabRef,
        selection: Option<&str>,
    ) -> Result<KnowledgeEntry, AppError> {
        let selection = selection.filter(|text| !text.trim().is_empty());

        let (content, page_title) = match selection {
            Some(text) => (text.to_string(), None),
            None => {
                let html = self.fetcher.fetch_html(&tab.url).await?;
                let page = extract_page_content(&html, &tab.url);
                log::debug!(
                    "extracted {} chars from {} (author {:?}, published {:?}): {:?}",
                    page.text.chars().count(),
                    page.url,
                    page.author,
                    page.publish_date,
                    page.description
                );
                (page.text, Some(page.title))
            }
        };

        let summary = self.summarize(&content).await;

        let title = tab
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or(page_title.filter(|t| !t.is_empty()))
            .unwrap_or_else(|| tab.url.clone());

        let entry = KnowledgeEntry {
            id: EntryId::generate(),
            title,
            url: tab.url.clone(),
            summary,
            full_text: truncate_chars(&content, self.limits.full_text_max_chars).to_string(),
            saved_at: Utc::now(),
            tags: vec![],
            is_selection: selection.is_some(),
        };

        let total = self.knowledge.prepend(entry.clone()).await?;
        log::info!("saved {:?}, {total} entries stored", entry.title);

        Ok(entry)
    }

    async fn summarize(&self, content: &str) -> String {
        if self.capabilities.can_summarize && !content.is_empty() {
            let input = truncate_chars(content, self.limits.summarize_input_max_chars);
            match self.ai.summarize(input, SummarizeOptions::PAGE).await {
                Ok(summary) => return summary,
                Err(err) => log::warn!("summarization failed: {err}"),
            }
        }

        fallback_summary(content, self.limits.summary_fallback_chars)
    }

    pub async fn search_knowledge(&self, query: &str) -> SearchResponse {
        let entries = match self.knowledge.all().await {
            Ok(entries) => entries,
            Err(err) => {
                log::error!("error reading knowledge base: {err}");
                return SearchResponse::failed(err);
            }
        };

        if entries.is_empty() {
            return SearchResponse::empty_base();
        }

        if self.capabilities.can_prompt && !query.trim().is_empty() {
            match self.semantic_search(query.trim(), &entries).await {
                Ok(results) => return SearchResponse::found(results),
                Err(err) => {
                    log::warn!("semantic search failed, falling back to keyword search: {err}")
                }
            }
        }

        SearchResponse::found(keyword_filter(&entries, query))
    }

    async fn semantic_search(
        &self,
        query: &str,
        entries: &[KnowledgeEntry],
    ) -> Result<Vec<KnowledgeEntry>, AppError> {
        let window = &entries[..entries.len().min(self.limits.semantic_context_entries)];
        let prompt = search::build_prompt(query, &search::build_context(window));

        let reply = self.ai.prompt(search::SYSTEM_PROMPT, &prompt).await?;
        log::debug!("ranking reply: {reply:?}");

        Ok(search::parse_ranked_indices(&reply, window.len())
            .into_iter()
            .map(|idx| window[idx].clone())
            .collect())
    }

    pub async fn get_all_pages(&self) -> SearchResponse {
        match self.knowledge.all().await {
            Ok(entries) => SearchResponse::found(entries),
            Err(err) => {
                log::error!("error reading knowledge base: {err}");
                SearchResponse::failed(err)
            }
        }
    }

    pub async fn rewrite_note(&self, text: &str) -> RewriteResponse {
        if !self.capabilities.can_rewrite {
            return RewriteResponse::failed(AppError::Unavailable(Capability::Rewrite));
        }

        match self.ai.rewrite(text, RewriteOptions::NOTE).await {
            Ok(rewritten) => RewriteResponse::rewritten(rewritten),
            Err(err) => {
                log::error!("rewrite failed: {err}");
                RewriteResponse::failed(err)
            }
        }
    }
}
