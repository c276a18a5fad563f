//! Configuration model loaded from external sources.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::SIMILARITY_THRESHOLD;

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Settings shared by the worker and its job handlers.
///
/// Values come from an optional `config.yaml` in the working directory,
/// overridden by `APP_`-prefixed environment variables
/// (`APP_DATABASE_URL`, `APP_SIMILARITY_THRESHOLD`, ...).
pub struct ServerConfig {
    pub database_url: String,
    pub zmq_address: String,
    /// Name of the sentence-embedding model, see
    /// [`crate::processing::embedding::FastEmbedder::new`].
    pub embedding_model: String,
    /// Length of every stored embedding. Must match `embedding_model`.
    pub embedding_dimensions: usize,
    pub similarity_threshold: f32,
    /// Maximum number of HTTP requests a crawler keeps in flight.
    pub crawler_concurrency: usize,
    /// How many matches a match job writes to the log.
    pub report_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "app.db".to_string(),
            zmq_address: "tcp://127.0.0.1:5555".to_string(),
            embedding_model: "all-minilm-l6-v2".to_string(),
            embedding_dimensions: 384,
            similarity_threshold: SIMILARITY_THRESHOLD,
            crawler_concurrency: 5,
            report_limit: 8,
        }
    }
}

impl ServerConfig {
    /// Load the configuration from `config.yaml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("config").required(false))
                .add_source(Environment::with_prefix("APP")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        builder
            .set_default("database_url", defaults.database_url)?
            .set_default("zmq_address", defaults.zmq_address)?
            .set_default("embedding_model", defaults.embedding_model)?
            .set_default("embedding_dimensions", defaults.embedding_dimensions as u64)?
            .set_default("similarity_threshold", f64::from(defaults.similarity_threshold))?
            .set_default("crawler_concurrency", defaults.crawler_concurrency as u64)?
            .set_default("report_limit", defaults.report_limit as u64)?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::ServerConfig;

    #[test]
    fn defaults_apply_when_no_source_is_set() {
        let config = ServerConfig::from_builder(Config::builder()).expect("valid config");

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.similarity_threshold, 0.9);
    }

    #[test]
    fn yaml_values_override_defaults() {
        let yaml = "database_url: catalog.db\nsimilarity_threshold: 0.75\nembedding_dimensions: 1024\n";
        let builder = Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml));

        let config = ServerConfig::from_builder(builder).expect("valid config");

        assert_eq!(config.database_url, "catalog.db");
        assert_eq!(config.similarity_threshold, 0.75);
        assert_eq!(config.embedding_dimensions, 1024);
        assert_eq!(config.zmq_address, "tcp://127.0.0.1:5555");
    }
}
