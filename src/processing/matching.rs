use std::sync::Arc;

use crate::domain::matching::Match;
use crate::domain::product::Product;
use crate::matcher::Matcher;
use crate::models::config::ServerConfig;
use crate::repository::ProductReader;
use crate::vector::DimensionMismatchError;

/// Products of `source`; a failed read counts as an empty source.
fn load_source<R>(repo: &R, source: &str) -> Vec<Product>
where
    R: ProductReader + ?Sized,
{
    match repo.list_products(source) {
        Ok(products) => {
            if products.is_empty() {
                log::warn!("No products for source {source}");
            }
            products
        }
        Err(e) => {
            log::error!("Error while loading products for source {source}: {e}");
            vec![]
        }
    }
}

/// Load both sources and pair each product of `source_a` with its best
/// counterpart in `source_b`.
pub fn match_sources<R>(
    repo: &R,
    source_a: &str,
    source_b: &str,
    threshold: f32,
) -> Result<Vec<Match>, DimensionMismatchError>
where
    R: ProductReader + ?Sized,
{
    let products_a = load_source(repo, source_a);
    let products_b = load_source(repo, source_b);

    let mut matcher = Matcher::with_threshold(&products_a, &products_b, threshold);
    matcher.find_best_matches()?;

    Ok(matcher.into_matches())
}

fn report_matches(source_a: &str, source_b: &str, matches: &[Match], limit: usize) {
    for found in matches.iter().take(limit) {
        let counterpart = found
            .b
            .as_ref()
            .map(|product| product.to_string())
            .unwrap_or_default();
        log::info!(
            "<<{source_a}>> {} <<{source_b}>> {counterpart} similarity: {}",
            found.a,
            found.score
        );
    }
}

/// Handle a request to match the products of two sources.
pub async fn process_match_message<R>(
    (source_a, source_b): (String, String),
    repo: R,
    config: Arc<ServerConfig>,
) where
    R: ProductReader + Send + 'static,
{
    log::info!("Product matching started: {source_a} against {source_b}");

    let threshold = config.similarity_threshold;
    let (job_a, job_b) = (source_a.clone(), source_b.clone());
    let outcome =
        tokio::task::spawn_blocking(move || match_sources(&repo, &job_a, &job_b, threshold))
            .await;

    match outcome {
        Ok(Ok(matches)) => {
            log::info!(
                "Product matching finished: {} matches found between {source_a} and {source_b}",
                matches.len()
            );
            report_matches(&source_a, &source_b, &matches, config.report_limit);
        }
        Ok(Err(e)) => {
            log::error!("Product matching between {source_a} and {source_b} aborted: {e}")
        }
        Err(e) => log::error!("Matching task for {source_a} and {source_b} panicked: {e}"),
    }
}
