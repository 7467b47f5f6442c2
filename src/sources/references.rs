//! Reference page fetcher.
//!
//! Pages are fetched concurrently, reduced to title, description and visible text, and
//! rendered as `---` delimited blocks in the order the URLs were given.

use crate::error::ApiError;
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MISSING: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    pub title: String,
    pub source: String,
    pub description: String,
    pub content: String,
}

impl ReferenceDocument {
    /// Extract title, meta description and visible text from an HTML page.
    pub fn from_html(source: &str, html: &str) -> Self {
        let title = title_regex()
            .captures(html)
            .map(|c| clean_inline(&c[1]))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| MISSING.to_string());
        let description = meta_regex()
            .find_iter(html)
            .map(|m| m.as_str())
            .find(|tag| description_name_regex().is_match(tag))
            .and_then(|tag| content_attr_regex().captures(tag))
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| clean_inline(m.as_str()))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| MISSING.to_string());

        Self {
            title,
            source: source.to_string(),
            description,
            content: visible_text(html),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "---\nTitle: {}\nSource: {}\nDescription: {}\n\nContent:\n{}\n---",
            self.title,
            self.source,
            self.description,
            self.content.trim()
        )
    }
}

pub struct ReferenceFetcher {
    client: Client,
}

impl ReferenceFetcher {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ApiError::CollaboratorUnavailable {
                collaborator: "reference fetcher".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Fetch every non-blank URL and render the results. Failing URLs are skipped.
    pub async fn fetch_all(&self, urls: &[String]) -> String {
        let urls: Vec<&str> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.is_empty() {
            return String::new();
        }

        let results = join_all(urls.iter().map(|url| self.fetch(url))).await;
        let blocks: Vec<String> = urls
            .iter()
            .zip(results)
            .filter_map(|(url, result)| match result {
                Ok(doc) => Some(doc.render()),
                Err(err) => {
                    warn!(url = %url, error = %err, "Skipping reference URL");
                    None
                }
            })
            .collect();
        info!(requested = urls.len(), loaded = blocks.len(), "Reference material loaded");
        blocks.join("\n\n")
    }

    pub async fn fetch(&self, url: &str) -> Result<ReferenceDocument, ApiError> {
        let unavailable = |message: String| ApiError::CollaboratorUnavailable {
            collaborator: format!("reference {}", url),
            message,
        };
        debug!(url, "Fetching reference page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }
        let body = response
            .text()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(ReferenceDocument::from_html(url, &body))
    }
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("static regex is valid"))
}

fn meta_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("static regex is valid"))
}

fn description_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:name|property)\s*=\s*["'](?:og:)?description["']"#)
            .expect("static regex is valid")
    })
}

fn content_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static regex is valid")
    })
}

fn invisible_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<!--.*?-->|<head\b.*?</head\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>",
        )
        .expect("static regex is valid")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex is valid"))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn clean_inline(text: &str) -> String {
    decode_entities(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn visible_text(html: &str) -> String {
    let stripped = invisible_regex().replace_all(html, " ");
    let stripped = tag_regex().replace_all(&stripped, "\n");
    decode_entities(&stripped)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
