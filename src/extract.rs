//! Page content extraction.
//!
//! Picks the main content root of an HTML document, skips navigation and ad
//! noise, and returns the visible text together with a few metadata fields.
//! This is a best-effort heuristic: missing elements just yield empty fields.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

use crate::{app::AppError, config::FetchConfig};

/// Candidate content roots, most specific first.
const CONTENT_ROOTS: [&str; 4] = ["article", "main", "[role=\"main\"]", "body"];

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, nav, footer, header, iframe, .ad, .advertisement")
        .expect("valid noise selector")
});

static ROOTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_ROOTS
        .iter()
        .map(|s| Selector::parse(s).expect("valid content root selector"))
        .collect()
});

const BLOCK_TAGS: &[&str] = &[
    "address", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure", "h1", "h2",
    "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre", "section", "table", "tr", "ul",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub text: String,
    pub title: String,
    pub url: String,
    pub author: String,
    pub description: String,
    pub publish_date: String,
}

pub fn extract_page_content(html: &str, url: &str) -> PageContent {
    let document = Html::parse_document(html);

    let text = ROOTS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(visible_text)
        .unwrap_or_default();

    PageContent {
        text,
        title: select_text(&document, "title"),
        url: url.to_string(),
        author: meta_content(&document, "meta[name=\"author\"]"),
        description: meta_content(&document, "meta[name=\"description\"]"),
        publish_date: meta_content(&document, "meta[property=\"article:published_time\"]"),
    }
}

fn select_text(document: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn meta_content(document: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn visible_text(root: ElementRef) -> String {
    let mut collector = TextCollector::default();
    collector.walk(root);

    collector
        .out
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
struct TextCollector {
    out: String,
    /// Previous text node ended in whitespace.
    pending_space: bool,
}

impl TextCollector {
    fn walk(&mut self, element: ElementRef) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(el) => {
                    let Some(child_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if NOISE.matches(&child_ref) {
                        continue;
                    }

                    let is_block = BLOCK_TAGS.contains(&el.name());
                    if is_block {
                        self.out.push('\n');
                    }
                    self.walk(child_ref);
                    if is_block {
                        self.out.push('\n');
                    }
                }
                _ => {}
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        let words = text.split_whitespace().collect::<Vec<_>>();
        if words.is_empty() {
            self.pending_space = !text.is_empty();
            return;
        }

        let separated = self.pending_space || text.starts_with(char::is_whitespace);
        if separated && !self.out.is_empty() && !self.out.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
        self.out.push_str(&words.join(" "));
        self.pending_space = text.ends_with(char::is_whitespace);
    }
}

/// Loads the HTML behind a tab url.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, AppError>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

/// Only http(s) pages can be captured.
pub fn validate_page_url(url: &str) -> Result<url::Url, AppError> {
    let parsed = url::Url::parse(url).map_err(|_| AppError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(AppError::InvalidUrl(url.to_string())),
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, AppError> {
        let url = validate_page_url(url)?;

        log::debug!("fetching {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
