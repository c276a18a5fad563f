pub mod crawlers;
pub mod db;
pub mod domain;
pub mod matcher;
pub mod models;
pub mod processing;
pub mod repository;
pub mod schema;
pub mod vector;

/// Default cosine-similarity threshold for cross-source matching.
pub const SIMILARITY_THRESHOLD: f32 = 0.9;
