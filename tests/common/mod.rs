//! Helpers for integration tests.
#![allow(dead_code)]

use catalog_matcher::db::{DbPool, establish_connection_pool, init_schema};
use catalog_matcher::domain::product::Product;
use catalog_matcher::repository::DieselRepository;
use tempfile::TempDir;

/// Temporary database used in integration tests.
pub struct TestDb {
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
        let path = dir.path().join("test.db");

        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        init_schema(&mut conn).expect("Failed to create schema.");

        TestDb { pool, _dir: dir }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repository(&self, dimensions: usize) -> DieselRepository {
        DieselRepository::new(self.pool(), dimensions)
    }
}

/// A product with both embeddings set to `embedding`.
pub fn embedded_product(source: &str, slug: &str, embedding: Vec<f32>) -> Product {
    Product {
        name: format!("{slug} name"),
        description: format!("{slug} description"),
        price: Some(100.0),
        image_url: Some(format!("https://{source}.md/img/{slug}.jpg")),
        name_embedding: Some(embedding.clone()),
        description_embedding: Some(embedding),
        ..Product::new(source, format!("https://{source}.md/{slug}"))
    }
}
