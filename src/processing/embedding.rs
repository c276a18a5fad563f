use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

use crate::domain::product::Product;
use crate::vector::normalize;

#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("unknown embedding model: {0}")]
    UnknownModel(String),
    #[error("failed to initialize embedding model: {0}")]
    Init(String),
}

/// Text to fixed-length vector.
pub trait Embedder {
    /// Embed `text`, or `None` when the model cannot produce a vector.
    fn embed(&mut self, text: &str) -> Option<Vec<f32>>;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimensions(&self) -> usize;
}

/// Resolve a configured model name into the fastembed model and its
/// output dimensionality.
pub fn embedding_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name {
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "paraphrase-multilingual-minilm-l12-v2" => {
            Some((EmbeddingModel::ParaphraseMLMiniLML12V2, 384))
        }
        "multilingual-e5-small" => Some((EmbeddingModel::MultilingualE5Small, 384)),
        "multilingual-e5-large" => Some((EmbeddingModel::MultilingualE5Large, 1024)),
        _ => None,
    }
}

/// Local sentence-embedding model. Returned vectors are L2-normalized.
pub struct FastEmbedder {
    model: TextEmbedding,
    dimensions: usize,
}

impl FastEmbedder {
    pub fn new(model_name: &str) -> Result<Self, EmbedderError> {
        let (model, dimensions) = embedding_model(model_name)
            .ok_or_else(|| EmbedderError::UnknownModel(model_name.to_string()))?;

        let model = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|error| EmbedderError::Init(format!("{error:?}")))?;

        Ok(Self { model, dimensions })
    }
}

impl Embedder for FastEmbedder {
    fn embed(&mut self, text: &str) -> Option<Vec<f32>> {
        match self.model.embed(vec![text], None) {
            Ok(embeddings) => embeddings
                .into_iter()
                .next()
                .map(|value| normalize(&value)),
            Err(error) => {
                log::error!("Failed to generate embedding: {error:?}");
                None
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EmbeddingStats {
    pub processed: usize,
    pub failed: usize,
    /// Products holding both embeddings, the only ones a match run scores.
    pub matchable: usize,
}

/// Fill both embeddings of every product.
///
/// A field the embedder cannot handle stays `None` and counts as a
/// failure, as does a vector of the wrong length.
pub fn embed_products<E>(products: &mut [Product], embedder: &mut E) -> EmbeddingStats
where
    E: Embedder + ?Sized,
{
    let mut stats = EmbeddingStats::default();
    let dimensions = embedder.dimensions();

    for product in products.iter_mut() {
        product.name_embedding = embed_field(embedder, &product.name, dimensions);
        if product.name_embedding.is_none() {
            log::warn!("Error generating embedding for product name: {product}");
            stats.failed += 1;
        }

        product.description_embedding = embed_field(embedder, &product.description, dimensions);
        if product.description_embedding.is_none() {
            log::warn!("Error generating embedding for product description: {product}");
            stats.failed += 1;
        }

        if product.is_embedded() {
            stats.matchable += 1;
        }
        stats.processed += 1;
    }

    stats
}

fn embed_field<E>(embedder: &mut E, text: &str, dimensions: usize) -> Option<Vec<f32>>
where
    E: Embedder + ?Sized,
{
    embedder
        .embed(text)
        .filter(|embedding| embedding.len() == dimensions)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::{Embedder, EmbeddingStats, embed_products, embedding_model};
    use crate::domain::product::Product;

    /// Embedder answering from a fixed table; unknown text yields `None`.
    pub(crate) struct TableEmbedder {
        pub(crate) table: HashMap<String, Vec<f32>>,
        pub(crate) dimensions: usize,
    }

    impl TableEmbedder {
        pub(crate) fn new(dimensions: usize, entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(text, vector)| (text.to_string(), vector.clone()))
                    .collect(),
                dimensions,
            }
        }
    }

    impl Embedder for TableEmbedder {
        fn embed(&mut self, text: &str) -> Option<Vec<f32>> {
            self.table.get(text).cloned()
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn product(name: &str, description: &str) -> Product {
        Product {
            name: name.to_string(),
            description: description.to_string(),
            ..Product::new("test", format!("https://example.com/{name}"))
        }
    }

    #[test]
    fn fills_both_embeddings() {
        let mut embedder =
            TableEmbedder::new(2, &[("Cream", vec![1.0, 0.0]), ("Soft", vec![0.0, 1.0])]);
        let mut products = vec![product("Cream", "Soft")];

        let stats = embed_products(&mut products, &mut embedder);

        assert_eq!(stats, EmbeddingStats {
                processed: 1,
                failed: 0,
                matchable: 1
            });
        assert_eq!(products[0].name_embedding, Some(vec![1.0, 0.0]));
        assert_eq!(products[0].description_embedding, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn missing_embedding_leaves_field_unset() {
        let mut embedder = TableEmbedder::new(2, &[("Cream", vec![1.0, 0.0])]);
        let mut products = vec![product("Cream", "unknown"), product("other", "unknown")];

        let stats = embed_products(&mut products, &mut embedder);

        assert_eq!(stats, EmbeddingStats {
                processed: 2,
                failed: 3,
                matchable: 0
            });
        assert!(products[0].name_embedding.is_some());
        assert!(products[0].description_embedding.is_none());
        assert!(!products[1].is_embedded());
    }

    #[test]
    fn wrong_length_is_treated_as_missing() {
        let mut embedder = TableEmbedder::new(
            2,
            &[("Cream", vec![1.0, 0.0, 0.0]), ("Soft", vec![0.0, 1.0])],
        );
        let mut products = vec![product("Cream", "Soft")];

        let stats = embed_products(&mut products, &mut embedder);

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.matchable, 0);
        assert!(products[0].name_embedding.is_none());
    }

    #[test]
    fn known_model_names_resolve_with_dimensions() {
        assert_eq!(embedding_model("all-minilm-l6-v2").map(|(_, d)| d), Some(384));
        assert_eq!(embedding_model("multilingual-e5-large").map(|(_, d)| d), Some(1024));
        assert!(embedding_model("no-such-model").is_none());
    }
}
