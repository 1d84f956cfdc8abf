//! Live source: pulls headline links from regulator web pages.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regcopilot_core::RawDocument;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::{DocumentSource, SourceError};

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("valid anchor regex"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Fetches each configured URL and turns its first few non-empty link texts
/// into documents whose content is the headline itself.
pub struct WebSource {
    client: reqwest::Client,
    urls: Vec<String>,
    per_source: usize,
}

impl WebSource {
    pub fn new(
        urls: Vec<String>,
        per_source: usize,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            urls,
            per_source,
        })
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<RawDocument>, SourceError> {
        info!(url = %url, "fetching regulatory page");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Server {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = resp.text().await?;

        Ok(extract_headlines(&html, self.per_source)
            .into_iter()
            .map(|title| RawDocument {
                id: headline_id(&title),
                content: title.clone(),
                title,
                source: url.to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl DocumentSource for WebSource {
    fn name(&self) -> &str {
        "live"
    }

    /// A URL that fails is logged and skipped; the rest still contribute.
    async fn fetch(&self) -> Result<Vec<RawDocument>, SourceError> {
        let mut docs = Vec::new();
        for url in &self.urls {
            match self.fetch_url(url).await {
                Ok(found) => docs.extend(found),
                Err(e) => error!(url = %url, error = %e, "error fetching source"),
            }
        }
        info!(count = docs.len(), "fetched live documents");
        Ok(docs)
    }
}

/// Visible text of the first `limit` non-empty anchors in `html`.
pub fn extract_headlines(html: &str, limit: usize) -> Vec<String> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|inner| clean_text(inner.as_str()))
        .filter(|t| !t.is_empty())
        .take(limit)
        .collect()
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Stable document id derived from the headline text.
pub fn headline_id(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
    format!("doc_{hex}")
}
