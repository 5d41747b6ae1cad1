use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::SearchConfig;

/// Fixed keywords appended to every search query
const QUERY_KEYWORDS: &str = "whiskey ウィスキー テイスティング";

/// CSS selector for short result snippets on the search result page
const SNIPPET_SELECTOR: &str = "div.BNeawe, div.VuuXrf";

/// Seam for the snippet lookup so the pipeline can be tested without the
/// network. The production implementation converts its own failures into
/// deterministic strings and only mocks ever return `Err`.
#[async_trait]
pub trait SnippetSearch: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<String>;
}

/// Looks a whiskey up on a web search endpoint and scrapes short text
/// snippets from the result page. Single attempt per call, no retries.
pub struct WebSearchClient {
    client: reqwest::Client,
    config: SearchConfig,
}

impl WebSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn fetch_snippets(&self, name: &str) -> Result<Vec<String>> {
        let query = format!("{name} {QUERY_KEYWORDS}");
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = format!(
            "{}?q={}&num={}",
            self.config.endpoint, encoded, self.config.max_snippets
        );

        debug!(name, "fetching search snippets");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;

        Ok(self.scrape_snippets(&body))
    }

    fn scrape_snippets(&self, html: &str) -> Vec<String> {
        let selector = match Selector::parse(SNIPPET_SELECTOR) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        let document = Html::parse_document(html);
        document
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| text.chars().count() > self.config.min_snippet_chars)
            .take(self.config.max_snippets)
            .collect()
    }
}

#[async_trait]
impl SnippetSearch for WebSearchClient {
    /// Returns joined snippets, or a deterministic "not found" / error
    /// message. Transport and parsing failures never propagate.
    async fn lookup(&self, name: &str) -> Result<String> {
        match self.fetch_snippets(name).await {
            Ok(snippets) if snippets.is_empty() => {
                debug!(name, "no qualifying snippets in search results");
                Ok(format!("{name}の情報が見つかりませんでした"))
            }
            Ok(snippets) => Ok(snippets.join("\n")),
            Err(e) => {
                warn!(name, error = %e, "search request failed");
                Ok(format!("{name}の検索でエラーが発生しました"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> WebSearchClient {
        WebSearchClient::new(&SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_scrape_filters_short_snippets() {
        let html = r#"
            <html><body>
                <div class="BNeawe">Macallan 12 Year Old Sherry Oak single malt scotch</div>
                <div class="BNeawe">short</div>
                <div class="VuuXrf">A rich dried-fruit and sherry led dram from Speyside</div>
                <div class="other">This ranked div should never be collected here at all</div>
            </body></html>"#;

        let snippets = test_client().scrape_snippets(html);
        assert_eq!(snippets.len(), 2);
        assert!(snippets[0].starts_with("Macallan 12"));
    }

    #[test]
    fn test_scrape_caps_snippet_count() {
        let divs: String = (0..10)
            .map(|i| format!("<div class=\"BNeawe\">result snippet number {i} with enough length</div>"))
            .collect();
        let html = format!("<html><body>{divs}</body></html>");

        let snippets = test_client().scrape_snippets(&html);
        assert_eq!(snippets.len(), SearchConfig::default().max_snippets);
    }

    #[test]
    fn test_scrape_counts_chars_not_bytes() {
        // 16 Japanese characters: over the 15-char floor despite no ASCII
        let html = r#"<div class="BNeawe">これは十六文字のテスト用抜粋です。</div>"#;
        let snippets = test_client().scrape_snippets(html);
        assert_eq!(snippets.len(), 1);
    }
}
