use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use html_escape::decode_html_entities;
use scraper::Html;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::domain::product::Product;

pub mod moonglow;
pub mod myskin;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("failed to build crawler: {0}")]
    Build(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {0}")]
    Status(u16),
}

pub type CrawlerResult<T> = Result<T, CrawlerError>;

pub(crate) fn build_reqwest_client() -> CrawlerResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| CrawlerError::Build(e.to_string()))
}

/// HTTP client limiting concurrent requests with a [`Semaphore`].
pub(crate) struct Fetcher {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl Fetcher {
    pub(crate) fn new(concurrency: usize) -> CrawlerResult<Self> {
        Ok(Self {
            client: build_reqwest_client()?,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        })
    }

    /// Fetch the body of `url`. Non-success statuses are errors.
    pub(crate) async fn fetch_text(&self, url: &str) -> CrawlerResult<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| CrawlerError::Request(e.to_string()))?;
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CrawlerError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(CrawlerError::Status(res.status().as_u16()));
        }
        res.text()
            .await
            .map_err(|e| CrawlerError::Request(e.to_string()))
    }

    /// Fetch `url` and parse it into [`Html`], logging failures.
    pub(crate) async fn fetch_html(&self, url: &str) -> Option<Html> {
        match self.fetch_text(url).await {
            Ok(text) => Some(Html::parse_document(&text)),
            Err(e) => {
                log::error!("Failed to get URL {url}: {e}");
                None
            }
        }
    }
}

/// Collapse whitespace runs into single spaces.
pub(crate) fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip JSON escaping left in links taken from raw AJAX payloads.
pub(crate) fn clean_link(href: &str) -> String {
    decode_html_entities(href.replace('\\', "").trim_matches('"')).into_owned()
}

/// Parse a price such as `"1 250,50 MDL"` or `"1.250,50"` into `1250.5`.
///
/// The last `.` or `,` is the decimal separator when at most two digits
/// follow it; any other separator groups thousands.
pub(crate) fn parse_price(text: &str) -> Option<f64> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let numeric = numeric.trim_matches(|c| c == '.' || c == ',');

    let normalized = match numeric.rfind(['.', ',']) {
        Some(pos) if numeric.len() - pos - 1 <= 2 => {
            let (int_part, frac_part) = numeric.split_at(pos);
            let int_part: String = int_part.chars().filter(char::is_ascii_digit).collect();
            format!("{int_part}.{}", &frac_part[1..])
        }
        _ => numeric.chars().filter(char::is_ascii_digit).collect(),
    };
    normalized.parse().ok()
}

/// A catalog source producing [`Product`]s without embeddings.
#[async_trait]
pub trait WebstoreCrawler: Send + Sync {
    /// Tag stored with every product of this source.
    fn source(&self) -> &str;

    /// Number of listing pages behind `url`; `0` when it cannot be
    /// determined.
    async fn max_pages(&self, url: &str) -> usize;

    /// Walks the catalog listing and returns every product page URL.
    async fn get_product_links(&self) -> Vec<String>;

    /// Fetches and parses a single product page.
    async fn get_product(&self, url: &str) -> Option<Product>;

    /// Crawls the entire catalog.
    ///
    /// Product pages are fetched concurrently; the result holds one product
    /// per URL.
    async fn get_products(&self) -> Vec<Product> {
        let mut seen = HashSet::new();
        let links: Vec<String> = self
            .get_product_links()
            .await
            .into_iter()
            .filter(|link| seen.insert(link.clone()))
            .collect();
        log::info!("Found {} product links for {}", links.len(), self.source());

        let tasks = links.iter().map(|link| self.get_product(link));
        let products = futures::future::join_all(tasks).await;

        let failed = products.iter().filter(|p| p.is_none()).count();
        if failed > 0 {
            log::warn!("Failed to parse {failed} products for {}", self.source());
        }

        products.into_iter().flatten().collect()
    }
}
