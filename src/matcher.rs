//! Best-match search between two product lists.

use crate::SIMILARITY_THRESHOLD;
use crate::domain::matching::Match;
use crate::domain::product::Product;
use crate::vector::{DimensionMismatchError, cosine_similarity};

/// Pairs every product of list A with its most similar product of list B.
///
/// A pair is eligible only when both products carry a description
/// embedding, while the score compared is the similarity of their name
/// embeddings. The first B product reaching the highest score wins, and the
/// pair is kept when that score is at least `threshold`.
///
/// Results accumulate: running [`Matcher::find_best_matches`] twice appends
/// a second set of matches. Use [`Matcher::clear`] to start over.
#[derive(Debug)]
pub struct Matcher<'a> {
    products_a: &'a [Product],
    products_b: &'a [Product],
    threshold: f32,
    matches: Vec<Match>,
}

impl<'a> Matcher<'a> {
    pub fn new(products_a: &'a [Product], products_b: &'a [Product]) -> Self {
        Self::with_threshold(products_a, products_b, SIMILARITY_THRESHOLD)
    }

    pub fn with_threshold(
        products_a: &'a [Product],
        products_b: &'a [Product],
        threshold: f32,
    ) -> Self {
        Self {
            products_a,
            products_b,
            threshold,
            matches: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Search the best B product for every A product, in list order.
    ///
    /// Fails on the first pair whose name embeddings differ in length.
    /// Matches found for earlier A products are kept in that case.
    pub fn find_best_matches(&mut self) -> Result<(), DimensionMismatchError> {
        let before = self.matches.len();

        for product_a in self.products_a {
            if let Some((best, score)) = self.best_match(product_a)?
                && score >= self.threshold
            {
                self.matches.push(Match {
                    a: product_a.clone(),
                    b: Some(best.clone()),
                    score,
                });
            }
        }

        log::debug!(
            "Matched {} of {} products against {} candidates",
            self.matches.len() - before,
            self.products_a.len(),
            self.products_b.len()
        );

        Ok(())
    }

    /// Accumulated matches, in the order they were found.
    pub fn get_matches(&self) -> &[Match] {
        &self.matches
    }

    /// Consume the matcher and return the accumulated matches.
    pub fn into_matches(self) -> Vec<Match> {
        self.matches
    }

    /// Drop all accumulated matches.
    pub fn clear(&mut self) {
        self.matches.clear();
    }

    fn best_match(
        &self,
        product_a: &Product,
    ) -> Result<Option<(&'a Product, f32)>, DimensionMismatchError> {
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;

        if product_a.description_embedding.is_none() {
            return Ok(None);
        }

        for product_b in self.products_b {
            if product_b.description_embedding.is_none() {
                continue;
            }
            let (Some(name_a), Some(name_b)) = (
                product_a.name_embedding.as_deref(),
                product_b.name_embedding.as_deref(),
            ) else {
                continue;
            };

            let score = cosine_similarity(name_a, name_b)?;
            // Strict comparison keeps the earliest candidate on ties.
            if score > best_score {
                best_score = score;
                best = Some(product_b);
            }
        }

        Ok(best.map(|product| (product, best_score)))
    }
}
