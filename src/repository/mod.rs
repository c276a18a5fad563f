use crate::db::{DbConnection, DbPool};
use crate::domain::product::{Product, ProductEmbeddings};

pub mod errors;
pub mod product;

use errors::RepositoryResult;

pub trait ProductReader {
    /// All products of `source`, embeddings decoded.
    fn list_products(&self, source: &str) -> RepositoryResult<Vec<Product>>;
    /// Only the embeddings of the products of `source`.
    fn list_embeddings(&self, source: &str) -> RepositoryResult<Vec<ProductEmbeddings>>;
}

pub trait ProductWriter {
    /// Insert products, replacing any stored row with the same
    /// `(source, url)`.
    fn save_products(&self, products: &[Product]) -> RepositoryResult<usize>;
    fn delete_products(&self, source: &str) -> RepositoryResult<usize>;
    /// Replace every stored product of `source` with `products` in one
    /// transaction. Returns `(deleted, saved)`; on error nothing changes.
    fn replace_products(
        &self,
        source: &str,
        products: &[Product],
    ) -> RepositoryResult<(usize, usize)>;
}

/// Diesel-backed repository over a SQLite pool.
///
/// Stored embeddings are decoded with a fixed dimensionality.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
    dimensions: usize,
}

impl DieselRepository {
    pub fn new(pool: DbPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}
