use std::sync::Arc;

use futures::future;

use crate::crawlers::moonglow::WebstoreCrawlerMoonglow;
use crate::crawlers::myskin::WebstoreCrawlerMyskin;
use crate::crawlers::{CrawlerError, CrawlerResult, WebstoreCrawler};
use crate::domain::product::Product;
use crate::models::config::ServerConfig;
use crate::processing::ProcessingError;
use crate::processing::embedding::{Embedder, EmbeddingStats, FastEmbedder, embed_products};
use crate::repository::ProductWriter;

/// Build the crawler registered for `source`.
pub fn create_crawler(
    source: &str,
    concurrency: usize,
) -> CrawlerResult<Box<dyn WebstoreCrawler>> {
    match source {
        "moonglow" => Ok(Box::new(WebstoreCrawlerMoonglow::new(concurrency)?)),
        "myskin" => Ok(Box::new(WebstoreCrawlerMyskin::new(concurrency)?)),
        _ => Err(CrawlerError::Build(format!("unknown source: {source}"))),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StoreStats {
    pub embeddings: EmbeddingStats,
    pub deleted: usize,
    pub saved: usize,
}

/// Embed `products` and persist them.
///
/// With `replace_source` set, the stored products of that source are
/// swapped for `products` in one transaction, so a failed write keeps the
/// previous catalog. Otherwise products are upserted by `(source, url)`.
pub fn store_products<R, E>(
    mut products: Vec<Product>,
    embedder: &mut E,
    repo: &R,
    dimensions: usize,
    replace_source: Option<&str>,
) -> Result<StoreStats, ProcessingError>
where
    R: ProductWriter,
    E: Embedder + ?Sized,
{
    if embedder.dimensions() != dimensions {
        return Err(ProcessingError::Dimensions {
            configured: dimensions,
            model: embedder.dimensions(),
        });
    }

    let embeddings = embed_products(&mut products, embedder);

    let (deleted, saved) = match replace_source {
        Some(source) => repo.replace_products(source, &products)?,
        None => (0, repo.save_products(&products)?),
    };

    Ok(StoreStats {
        embeddings,
        deleted,
        saved,
    })
}

/// Processes a crawl request for one source.
///
/// Without URLs the whole catalog is crawled and replaces the stored
/// products of the source. With URLs only those product pages are fetched
/// and upserted.
pub async fn process_crawler_message<R>(
    (source, urls): (String, Vec<String>),
    repo: R,
    config: Arc<ServerConfig>,
) where
    R: ProductWriter + Send + 'static,
{
    log::info!("Received crawler: {source} ({} urls)", urls.len());

    let web_crawler = match create_crawler(&source, config.crawler_concurrency) {
        Ok(crawler) => crawler,
        Err(e) => {
            log::error!("Failed to create crawler {source}: {e}");
            return;
        }
    };

    let refresh_all = urls.is_empty();
    let products = if refresh_all {
        web_crawler.get_products().await
    } else {
        let tasks = urls.iter().map(|url| web_crawler.get_product(url));
        future::join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
    };

    if products.is_empty() {
        log::warn!("No products crawled for {source}, keeping stored data");
        return;
    }
    log::info!("Crawled {} products for {source}", products.len());

    let job_source = source.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut embedder = FastEmbedder::new(&config.embedding_model)?;
        let replace_source = refresh_all.then_some(job_source.as_str());
        store_products(
            products,
            &mut embedder,
            &repo,
            config.embedding_dimensions,
            replace_source,
        )
    })
    .await;

    match outcome {
        Ok(Ok(stats)) => {
            if stats.embeddings.failed > 0 {
                log::warn!(
                    "Embedding generation for {source} finished with {} errors",
                    stats.embeddings.failed
                );
            }
            log::info!(
                "Finished processing crawler {source}: embedded={}, matchable={}, deleted={}, saved={}",
                stats.embeddings.processed,
                stats.embeddings.matchable,
                stats.deleted,
                stats.saved
            );
        }
        Ok(Err(e)) => log::error!("Failed to store products for {source}: {e}"),
        Err(e) => log::error!("Crawler task for {source} panicked: {e}"),
    }
}
