use serde::Deserialize;
use thiserror::Error;

use crate::processing::embedding::EmbedderError;
use crate::repository::errors::RepositoryError;

pub mod crawler;
pub mod embedding;
pub mod matching;

#[derive(Deserialize, Debug, PartialEq)]
pub enum ZMQMessage {
    Crawl(String),
    CrawlProducts((String, Vec<String>)),
    Match((String, String)),
}

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Embedder(#[from] EmbedderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("embedding model produces {model} dimensions, store expects {configured}")]
    Dimensions { configured: usize, model: usize },
}

#[cfg(test)]
mod tests {
    use super::ZMQMessage;

    #[test]
    fn parses_crawl_message() {
        let msg: ZMQMessage = serde_json::from_str(r#"{"Crawl":"moonglow"}"#).expect("valid json");

        assert_eq!(msg, ZMQMessage::Crawl("moonglow".to_string()));
    }

    #[test]
    fn parses_crawl_products_message() {
        let msg: ZMQMessage =
            serde_json::from_str(r#"{"CrawlProducts":["myskin",["https://myskin.md/foam"]]}"#)
                .expect("valid json");

        assert_eq!(
            msg,
            ZMQMessage::CrawlProducts((
                "myskin".to_string(),
                vec!["https://myskin.md/foam".to_string()]
            ))
        );
    }

    #[test]
    fn parses_match_message() {
        let msg: ZMQMessage =
            serde_json::from_str(r#"{"Match":["moonglow","myskin"]}"#).expect("valid json");

        assert_eq!(
            msg,
            ZMQMessage::Match(("moonglow".to_string(), "myskin".to_string()))
        );
    }

    #[test]
    fn rejects_unknown_message() {
        assert!(serde_json::from_str::<ZMQMessage>(r#"{"Reindex":1}"#).is_err());
    }
}
