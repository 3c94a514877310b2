use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::models::ConfigError;

/// Configuration for knowledge URL fetching
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Per-request timeout, seconds
    pub timeout_seconds: u64,
    /// Truncate fetched content to this many characters
    pub max_content_length: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_content_length: 100_000,
        }
    }
}

impl KnowledgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.max_content_length == 0 {
            return Err(ConfigError::Invalid(
                "max_content_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fetched reference document
#[derive(Debug, Clone)]
pub struct KnowledgeSnippet {
    pub url: String,
    pub text: String,
}

/// Fetch supplementary reference pages named in the pipeline config.
///
/// Fetch failures degrade to fewer snippets; they never abort processing.
pub struct KnowledgeFetcher {
    client: Client,
    config: KnowledgeConfig,
    tag_pattern: Regex,
    script_pattern: Regex,
}

impl KnowledgeFetcher {
    pub fn new(config: KnowledgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let script_pattern = Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>")
            .map_err(|e| ConfigError::Invalid(format!("invalid strip pattern: {}", e)))?;
        let tag_pattern = Regex::new(r"<[^>]+>")
            .map_err(|e| ConfigError::Invalid(format!("invalid tag pattern: {}", e)))?;
        Ok(Self {
            client: Client::new(),
            config,
            tag_pattern,
            script_pattern,
        })
    }

    /// Fetch all URLs, concurrently first. If any fetch fails, that attempt's
    /// results are discarded and the whole batch is retried sequentially;
    /// URLs that still fail are skipped with a warning.
    pub async fn fetch_urls(&self, urls: &[String]) -> Vec<KnowledgeSnippet> {
        let urls: Vec<&String> = urls.iter().filter(|u| !u.trim().is_empty()).collect();
        if urls.is_empty() {
            return Vec::new();
        }

        let attempts = join_all(urls.iter().map(|url| self.fetch_one(url))).await;
        if attempts.iter().all(|r| r.is_ok()) {
            return attempts.into_iter().flatten().collect();
        }
        warn!("Concurrent knowledge fetch failed, retrying sequentially");

        let mut snippets = Vec::new();
        for url in urls {
            match self.fetch_one(url).await {
                Ok(snippet) => snippets.push(snippet),
                Err(e) => warn!("Skipping knowledge URL {}: {}", url, e),
            }
        }
        snippets
    }

    async fn fetch_one(&self, url: &str) -> Result<KnowledgeSnippet> {
        let response = self
            .client
            .get(url.trim())
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {} from {}", response.status(), url);
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;

        let text = self.extract_text(&body);
        info!("Fetched {} chars of reference text from {}", text.len(), url);

        Ok(KnowledgeSnippet {
            url: url.trim().to_string(),
            text,
        })
    }

    /// Crude HTML-to-text: drop script/style blocks, strip remaining tags,
    /// collapse whitespace, truncate
    fn extract_text(&self, body: &str) -> String {
        let without_scripts = self.script_pattern.replace_all(body, " ");
        let without_tags = self.tag_pattern.replace_all(&without_scripts, " ");
        let collapsed = without_tags.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(self.config.max_content_length).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_strips_markup() {
        let fetcher = KnowledgeFetcher::new(KnowledgeConfig::default()).unwrap();
        let html = "<html><head><script>var x = 1;</script><style>p { color: red }</style></head>\
                    <body><h1>Export limits</h1><p>Exports are capped at 10k rows.</p></body></html>";
        let text = fetcher.extract_text(html);
        assert!(text.contains("Export limits"));
        assert!(text.contains("capped at 10k rows"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_extract_text_truncates() {
        let config = KnowledgeConfig {
            max_content_length: 10,
            ..KnowledgeConfig::default()
        };
        let fetcher = KnowledgeFetcher::new(config).unwrap();
        let text = fetcher.extract_text("<p>a very long body of reference text</p>");
        assert_eq!(text.chars().count(), 10);
    }

    #[tokio::test]
    async fn test_blank_urls_are_skipped() {
        let fetcher = KnowledgeFetcher::new(KnowledgeConfig::default()).unwrap();
        let snippets = fetcher.fetch_urls(&["   ".to_string(), String::new()]).await;
        assert!(snippets.is_empty());
    }
}
