//! Breadth-first web crawler source adapter.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::time::sleep;
use url::Url;

use super::{SourceAdapter, SourceFile, SourceFileBatch};
use crate::types::RagError;

const MAX_FETCH_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Crawls `http(s)://` sources breadth-first, honoring a depth limit and a
/// same-origin robots policy.
pub struct WebCrawler {
    client: Client,
}

impl Default for WebCrawler {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("wellspring-ingest/0.1")
                .timeout(Duration::from_secs(300))
                .build()
                .expect("building reqwest client"),
        }
    }
}

impl WebCrawler {
    async fn fetch_with_retry(&self, url: &Url) -> Result<String, RagError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp.text().await.map_err(RagError::from);
                }
                Ok(resp) => {
                    if attempt >= MAX_FETCH_ATTEMPTS {
                        return Err(RagError::SourceUnreachable(format!(
                            "{url} returned status {}",
                            resp.status()
                        )));
                    }
                }
                Err(err) => {
                    if attempt >= MAX_FETCH_ATTEMPTS {
                        return Err(RagError::SourceUnreachable(err.to_string()));
                    }
                }
            }
            let backoff = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
            sleep(backoff).await;
        }
    }

    async fn allowed_by_robots(&self, origin: &Url) -> bool {
        let robots_url = match origin.join("/robots.txt") {
            Ok(u) => u,
            Err(_) => return true,
        };
        let Ok(resp) = self.client.get(robots_url).send().await else {
            return true;
        };
        let Ok(body) = resp.text().await else {
            return true;
        };
        !is_path_disallowed(&body, origin.path())
    }

    fn extract_links(&self, base: &Url, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("a[href]").expect("valid selector");
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .filter(|u| u.scheme() == "http" || u.scheme() == "https")
            .collect()
    }

    /// Strips scripts, styles, nav/header/footer and comments, then reduces
    /// what remains to plain UTF-8 text.
    fn clean_text(&self, html: &str) -> String {
        clean_html(html)
    }
}

/// Strips scripts, styles, nav/header/footer and comments, then reduces
/// what remains to plain UTF-8 text. Shared with the document normalizer so
/// HTML cleaning stays consistent between discovery and decode.
pub(crate) fn clean_html(html: &str) -> String {
    static NOISE_BLOCKS: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?is)<(script|style|nav|header|footer)\b[^>]*>.*?</\1>").unwrap()
    });
    static COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

    let stripped = COMMENTS.replace_all(html, "");
    let stripped = NOISE_BLOCKS.replace_all(&stripped, "");

    let document = Html::parse_document(&stripped);
    let body_selector =
        Selector::parse("body").unwrap_or_else(|_| Selector::parse("html").unwrap());
    let mut text = String::new();
    for root in document.select(&body_selector) {
        for fragment in root.text() {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    normalize_whitespace(&text)
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_path_disallowed(robots_txt: &str, path: &str) -> bool {
    let mut applies = false;
    for line in robots_txt.lines() {
        let line = line.trim();
        if let Some(agent) = line.strip_prefix("User-agent:") {
            applies = agent.trim() == "*";
        } else if applies {
            if let Some(rule) = line.strip_prefix("Disallow:") {
                let rule = rule.trim();
                if !rule.is_empty() && path.starts_with(rule) {
                    return true;
                }
            }
        }
    }
    false
}

#[async_trait]
impl SourceAdapter for WebCrawler {
    async fn discover(
        &self,
        engine_id: &str,
        root_url: &str,
        depth: u32,
        _staging_dir: &Path,
    ) -> Result<SourceFileBatch, RagError> {
        let root = Url::parse(root_url)
            .map_err(|e| RagError::Validation(format!("invalid crawl root {root_url}: {e}")))?;

        if !self.allowed_by_robots(&root).await {
            return Err(RagError::SourceAuth(format!(
                "robots policy disallows crawling {root}"
            )));
        }

        let mut visited_urls: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        queue.push_back((root.clone(), 0));
        visited_urls.insert(root.to_string());

        let mut files = Vec::new();
        let mut seen_hashes: HashSet<String> = HashSet::new();

        while let Some((url, level)) = queue.pop_front() {
            let html = self.fetch_with_retry(&url).await?;
            let text = self.clean_text(&html);
            let hash = SourceFile::content_hash_of(text.as_bytes());

            if seen_hashes.insert(hash.clone()) {
                files.push(SourceFile {
                    display_name: url
                        .path_segments()
                        .and_then(|mut s| s.next_back())
                        .filter(|s| !s.is_empty())
                        .unwrap_or("index")
                        .to_string(),
                    source_url: url.to_string(),
                    local_staging_path: None,
                    object_store_path: None,
                    mime_type: "text/html".to_string(),
                    content_hash: hash,
                    engine_id: engine_id.to_string(),
                });
            }

            if level >= depth {
                continue;
            }

            for link in self.extract_links(&url, &html) {
                if link.origin() != root.origin() {
                    continue;
                }
                let key = link.to_string();
                if visited_urls.insert(key) {
                    queue.push_back((link, level + 1));
                }
            }
        }

        Ok(files)
    }

    async fn fetch_bytes(&self, file: &SourceFile) -> Result<Vec<u8>, RagError> {
        let url = Url::parse(&file.source_url)
            .map_err(|e| RagError::Validation(format!("invalid url {}: {e}", file.source_url)))?;
        Ok(self.fetch_with_retry(&url).await?.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_disallow_matches_prefix() {
        let robots = "User-agent: *\nDisallow: /private\n";
        assert!(is_path_disallowed(robots, "/private/doc"));
        assert!(!is_path_disallowed(robots, "/public/doc"));
    }

    #[test]
    fn robots_rule_scoped_to_matching_agent() {
        let robots = "User-agent: othercrawler\nDisallow: /\n";
        assert!(!is_path_disallowed(robots, "/anything"));
    }
}
