use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::crawlers::{
    CrawlerError, CrawlerResult, Fetcher, WebstoreCrawler, clean_link, clean_text, parse_price,
};
use crate::domain::product::Product;

const CATALOG_URL: &str = "https://moonglow.md/ru/catalog/";
const LISTING_URL: &str = "https://www.moonglow.md/ru/catalog/page/{page}?loop={loop}&woo_ajax=1";
const PRODUCTS_PER_PAGE: usize = 30;

/// AJAX listing payload: the product grid is returned as an HTML string.
#[derive(Debug, Deserialize)]
struct ListingPage {
    items: String,
}

/// Crawler for `moonglow.md`.
///
/// The catalog is paged through the store's AJAX endpoint, which needs the
/// running number of products already shown (`loop`), so listing pages are
/// fetched one after another. Product pages are fetched concurrently.
pub struct WebstoreCrawlerMoonglow {
    source: String,
    fetcher: Fetcher,
    result_count: Regex,
}

impl WebstoreCrawlerMoonglow {
    pub fn new(concurrency: usize) -> CrawlerResult<Self> {
        Ok(Self {
            source: "moonglow".to_string(),
            fetcher: Fetcher::new(concurrency)?,
            result_count: Regex::new(r"Отображение \d+\s*[–-]\s*\d+ из (\d+)")
                .map_err(|e| CrawlerError::Build(e.to_string()))?,
        })
    }

    fn listing_url(page: usize, shown: usize) -> String {
        LISTING_URL
            .replace("{page}", &page.to_string())
            .replace("{loop}", &shown.to_string())
    }

    /// Page count derived from the "showing x–y of N" line.
    fn parse_max_pages(&self, document: &Html) -> usize {
        let selector = Selector::parse("p.woocommerce-result-count").unwrap();
        let Some(text) = document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
        else {
            return 0;
        };

        self.result_count
            .captures(&text)
            .and_then(|captures| captures[1].parse::<usize>().ok())
            .map(|total| total.div_ceil(PRODUCTS_PER_PAGE))
            .unwrap_or(0)
    }
}

/// Product links from one listing response.
///
/// The endpoint answers with JSON wrapping the grid HTML; a plain HTML body
/// is accepted as well.
fn parse_listing(body: &str) -> Vec<String> {
    let html = match serde_json::from_str::<ListingPage>(body) {
        Ok(page) => page.items,
        Err(_) => body.to_string(),
    };
    let document = Html::parse_fragment(&html);

    let selector = Selector::parse(".wd-entities-title a[href]").unwrap();
    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .map(clean_link)
        .filter(|href| !href.is_empty())
        .collect()
}

fn parse_product(document: &Html, source: &str, url: &str) -> Option<Product> {
    let name_selector = Selector::parse("h1.product_title").unwrap();
    let name = document
        .select(&name_selector)
        .next()
        .map(|el| clean_text(el.text()))
        .filter(|name| !name.is_empty())?;

    let desc_selector = Selector::parse("div.wc-tab-inner.wd-scroll-content").unwrap();
    let description = document
        .select(&desc_selector)
        .next()
        .map(|el| clean_text(el.text()))
        .unwrap_or_default();

    // The last amount is the current (possibly discounted) price.
    let price_selector = Selector::parse("span.woocommerce-Price-amount.amount").unwrap();
    let price = document
        .select(&price_selector)
        .last()
        .and_then(|el| parse_price(&el.text().collect::<String>()));

    let image_selector = Selector::parse("img.wp-post-image").unwrap();
    let image_url = document
        .select(&image_selector)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(str::to_string);

    Some(Product {
        name,
        description,
        price,
        image_url,
        ..Product::new(source, url)
    })
}

#[async_trait]
impl WebstoreCrawler for WebstoreCrawlerMoonglow {
    fn source(&self) -> &str {
        &self.source
    }

    async fn max_pages(&self, url: &str) -> usize {
        match self.fetcher.fetch_html(url).await {
            Some(document) => self.parse_max_pages(&document),
            None => 0,
        }
    }

    async fn get_product_links(&self) -> Vec<String> {
        let max_pages = self.max_pages(CATALOG_URL).await;
        if max_pages == 0 {
            log::warn!("The number of pages in the {} catalog is 0", self.source);
            return vec![];
        }

        let mut links = Vec::new();
        let mut shown = 0;
        for page in 1..=max_pages {
            let url = Self::listing_url(page, shown);
            let body = match self.fetcher.fetch_text(&url).await {
                Ok(body) => body,
                Err(CrawlerError::Status(404)) => {
                    log::warn!("Page #{page} of {} returned 404, stopping", self.source);
                    break;
                }
                Err(e) => {
                    log::error!("Failed to get page #{page} of {}: {e}", self.source);
                    continue;
                }
            };

            let page_links = parse_listing(&body);
            shown += page_links.len();
            links.extend(page_links);
        }

        links
    }

    async fn get_product(&self, url: &str) -> Option<Product> {
        let document = self.fetcher.fetch_html(url).await?;
        let product = parse_product(&document, &self.source, url);
        if product.is_none() {
            log::error!("Failed to parse product {url}");
        }
        product
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::{WebstoreCrawlerMoonglow, parse_listing, parse_product};

    const PRODUCT_PAGE: &str = r#"
        <html><body>
          <h1 class="product_title entry-title wd-entities-title"> Hydrating
             Toner 150 ml </h1>
          <p class="price">
            <del><span class="woocommerce-Price-amount amount">420,00&nbsp;MDL</span></del>
            <ins><span class="woocommerce-Price-amount amount">359,50&nbsp;MDL</span></ins>
          </p>
          <img class="wp-post-image wp-post-image" src="https://moonglow.md/img/toner.jpg">
          <div class="wc-tab-inner wd-scroll-content"><p>Gentle toner</p><p>for dry skin.</p></div>
        </body></html>
    "#;

    #[test]
    fn parses_product_page() {
        let document = Html::parse_document(PRODUCT_PAGE);

        let product = parse_product(&document, "moonglow", "https://moonglow.md/ru/p/toner")
            .expect("product parsed");

        assert_eq!(product.source, "moonglow");
        assert_eq!(product.url, "https://moonglow.md/ru/p/toner");
        assert_eq!(product.name, "Hydrating Toner 150 ml");
        assert_eq!(product.description, "Gentle toner for dry skin.");
        assert_eq!(product.price, Some(359.5));
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://moonglow.md/img/toner.jpg")
        );
        assert!(product.id.is_none());
        assert!(product.name_embedding.is_none());
    }

    #[test]
    fn product_without_title_is_rejected() {
        let document = Html::parse_document("<html><body><p>gone</p></body></html>");

        assert!(parse_product(&document, "moonglow", "https://moonglow.md/x").is_none());
    }

    #[test]
    fn parses_json_listing() {
        let body = r#"{"items":"<div class=\"wd-entities-title\"><a href=\"https:\/\/moonglow.md\/ru\/p\/a\">A<\/a><\/div><div class=\"wd-entities-title\"><a href=\"https:\/\/moonglow.md\/ru\/p\/b\">B<\/a><\/div>","status":"have-posts"}"#;

        assert_eq!(
            parse_listing(body),
            vec![
                "https://moonglow.md/ru/p/a".to_string(),
                "https://moonglow.md/ru/p/b".to_string()
            ]
        );
    }

    #[test]
    fn parses_html_listing() {
        let body = r#"<h3 class="wd-entities-title"><a href="https://moonglow.md/ru/p/c">C</a></h3>"#;

        assert_eq!(parse_listing(body), vec!["https://moonglow.md/ru/p/c".to_string()]);
    }

    #[test]
    fn max_pages_from_result_count() {
        let crawler = WebstoreCrawlerMoonglow::new(1).expect("crawler");
        let document = Html::parse_document(
            r#"<p class="woocommerce-result-count">Отображение 1–30 из 95</p>"#,
        );

        assert_eq!(crawler.parse_max_pages(&document), 4);
    }

    #[test]
    fn max_pages_is_zero_without_result_count() {
        let crawler = WebstoreCrawlerMoonglow::new(1).expect("crawler");
        let document = Html::parse_document("<p>empty</p>");

        assert_eq!(crawler.parse_max_pages(&document), 0);
    }

    #[test]
    fn listing_url_carries_page_and_offset() {
        assert_eq!(
            WebstoreCrawlerMoonglow::listing_url(3, 60),
            "https://www.moonglow.md/ru/catalog/page/3?loop=60&woo_ajax=1"
        );
    }
}
