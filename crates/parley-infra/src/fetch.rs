//! HTTP implementation of [`DocumentFetcher`].
//!
//! Fetches a page with reqwest and extracts its `<title>` and the text of
//! `<body>` with scraper. Script, style and noscript contents are skipped.

use std::time::Duration;

use scraper::{Html, Selector};

use parley_core::fetch::DocumentFetcher;
use parley_types::error::FetchError;
use parley_types::summary::Document;

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

pub struct HttpDocumentFetcher {
    client: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read body: {e}")))?;

        let document = extract_document(url, &html)?;
        tracing::debug!(url, title = %document.title, chars = document.text.len(), "Fetched document");
        Ok(document)
    }
}

/// Pull the title and readable text out of an HTML page.
///
/// The title falls back to `url` when the page has none.
pub fn extract_document(url: &str, html: &str) -> Result<Document, FetchError> {
    let page = Html::parse_document(html);
    let title_selector = selector("title")?;
    let body_selector = selector("body")?;

    let title = page
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string());

    let root = page
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| page.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let skipped = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| SKIPPED_ELEMENTS.contains(&name));
        if !skipped {
            text.push_str(fragment);
        }
    }

    if text.trim().is_empty() {
        return Err(FetchError::Parse(format!("no readable text in {url}")));
    }

    Ok(Document { title, text })
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("invalid selector '{css}': {e:?}")))
}
