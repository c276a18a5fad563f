use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::crawlers::{
    CrawlerError, CrawlerResult, Fetcher, WebstoreCrawler, clean_text, parse_price,
};
use crate::domain::product::Product;

const CATEGORY_PATHS: [&str; 3] = ["osnovnoj-uhod", "specialinyj-uhod", "ru/dlya-doma"];

/// Crawler for `myskin.md`.
///
/// Every category is paged with a `?page=N` query; the page count comes from
/// the pagination block of the first page.
pub struct WebstoreCrawlerMyskin {
    source: String,
    base_url: Url,
    category_urls: Vec<String>,
    fetcher: Fetcher,
}

impl WebstoreCrawlerMyskin {
    pub fn new(concurrency: usize) -> CrawlerResult<Self> {
        let base_url =
            Url::parse("https://myskin.md/").map_err(|e| CrawlerError::Build(e.to_string()))?;
        let category_urls = CATEGORY_PATHS
            .iter()
            .map(|path| base_url.join(path).map(|url| url.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CrawlerError::Build(e.to_string()))?;

        Ok(Self {
            source: "myskin".to_string(),
            base_url,
            category_urls,
            fetcher: Fetcher::new(concurrency)?,
        })
    }

    /// Product links from one category listing page.
    fn parse_product_links(&self, document: &Html) -> Vec<String> {
        let selector = Selector::parse("a.sing-product").unwrap();
        document
            .select(&selector)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                Some(self.base_url.join(href).ok()?.to_string())
            })
            .collect()
    }

    /// A category without pagination block has a single page.
    fn parse_max_pages(document: &Html) -> usize {
        let paginator = Selector::parse("div.paginatorextendwrapper").unwrap();
        if document.select(&paginator).next().is_none() {
            return 1;
        }

        let page_links = Selector::parse("a.pagelink").unwrap();
        document.select(&page_links).count()
    }

    fn parse_product(&self, document: &Html, url: &str) -> Option<Product> {
        let name_selector = Selector::parse("h1.product-name").unwrap();
        let name = document
            .select(&name_selector)
            .next()
            .map(|el| clean_text(el.text()))
            .filter(|name| !name.is_empty())?;

        // Description is the text of its paragraphs and list items.
        let desc_selector = Selector::parse("div.inset-text.pd-text").unwrap();
        let part_selector = Selector::parse("p, li").unwrap();
        let description = document
            .select(&desc_selector)
            .next()
            .map(|div| {
                div.select(&part_selector)
                    .map(|part| clean_text(part.text()))
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let price_selector = Selector::parse("div.price").unwrap();
        let price = document.select(&price_selector).next().and_then(|el| {
            let text = el.text().collect::<String>().to_lowercase();
            parse_price(text.split("mdl").next().unwrap_or_default())
        });

        let image_selector = Selector::parse("img.picture").unwrap();
        let image_url = document
            .select(&image_selector)
            .next()
            .and_then(|el| el.value().attr("src"))
            .and_then(|src| self.base_url.join(src).ok())
            .map(|url| url.to_string());

        Some(Product {
            name,
            description,
            price,
            image_url,
            ..Product::new(self.source.as_str(), url)
        })
    }
}

#[async_trait]
impl WebstoreCrawler for WebstoreCrawlerMyskin {
    fn source(&self) -> &str {
        &self.source
    }

    async fn max_pages(&self, url: &str) -> usize {
        match self.fetcher.fetch_html(url).await {
            Some(document) => Self::parse_max_pages(&document),
            None => 0,
        }
    }

    async fn get_product_links(&self) -> Vec<String> {
        let mut links = Vec::new();

        for category_url in &self.category_urls {
            let max_pages = self.max_pages(category_url).await;
            if max_pages == 0 {
                log::warn!("The number of pages for category {category_url} is 0");
                continue;
            }

            for page in 1..=max_pages {
                let url = format!("{category_url}?page={page}");
                let document = match self.fetcher.fetch_text(&url).await {
                    Ok(body) => Html::parse_document(&body),
                    Err(CrawlerError::Status(404)) => {
                        log::warn!("Page #{page} of {category_url} returned 404, stopping");
                        break;
                    }
                    Err(e) => {
                        log::error!("Failed to get page #{page} of {category_url}: {e}");
                        continue;
                    }
                };
                links.extend(self.parse_product_links(&document));
            }
        }

        links
    }

    async fn get_product(&self, url: &str) -> Option<Product> {
        let document = self.fetcher.fetch_html(url).await?;
        let product = self.parse_product(&document, url);
        if product.is_none() {
            log::error!("Failed to parse product {url}");
        }
        product
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::WebstoreCrawlerMyskin;

    fn crawler() -> WebstoreCrawlerMyskin {
        WebstoreCrawlerMyskin::new(1).expect("crawler")
    }

    #[test]
    fn parses_product_page() {
        let document = Html::parse_document(
            r#"
            <h1 class="product-name">Cleansing Foam</h1>
            <div class="price">245 MDL <span>old 300 mdl</span></div>
            <img class="picture" src="/images/foam.png">
            <div class="inset-text pd-text">
              <p>Mild foam.</p>
              <ul><li>pH 5.5</li><li>150 ml</li></ul>
            </div>
            "#,
        );

        let product = crawler()
            .parse_product(&document, "https://myskin.md/foam")
            .expect("product parsed");

        assert_eq!(product.source, "myskin");
        assert_eq!(product.name, "Cleansing Foam");
        assert_eq!(product.description, "Mild foam. pH 5.5 150 ml");
        assert_eq!(product.price, Some(245.0));
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://myskin.md/images/foam.png")
        );
    }

    #[test]
    fn description_is_optional() {
        let document = Html::parse_document(r#"<h1 class="product-name">Serum</h1>"#);

        let product = crawler()
            .parse_product(&document, "https://myskin.md/serum")
            .expect("product parsed");

        assert_eq!(product.description, "");
        assert_eq!(product.price, None);
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn parses_product_links_against_base_url() {
        let document = Html::parse_document(
            r#"<a class="sing-product" href="/foam">Foam</a><a class="other" href="/x">X</a>
               <a class="sing-product" href="https://myskin.md/serum">Serum</a>"#,
        );

        assert_eq!(
            crawler().parse_product_links(&document),
            vec![
                "https://myskin.md/foam".to_string(),
                "https://myskin.md/serum".to_string()
            ]
        );
    }

    #[test]
    fn max_pages_counts_page_links() {
        let paged = Html::parse_document(
            r#"<div class="paginatorextendwrapper">
                 <a class="pagelink" href="?page=1">1</a>
                 <a class="pagelink" href="?page=2">2</a>
                 <a class="pagelink" href="?page=3">3</a>
               </div>"#,
        );
        let single = Html::parse_document("<div>no pages</div>");

        assert_eq!(WebstoreCrawlerMyskin::parse_max_pages(&paged), 3);
        assert_eq!(WebstoreCrawlerMyskin::parse_max_pages(&single), 1);
    }

    #[test]
    fn category_urls_resolve_against_base() {
        assert_eq!(
            crawler().category_urls,
            vec![
                "https://myskin.md/osnovnoj-uhod".to_string(),
                "https://myskin.md/specialinyj-uhod".to_string(),
                "https://myskin.md/ru/dlya-doma".to_string()
            ]
        );
    }
}
