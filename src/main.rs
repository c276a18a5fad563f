use std::sync::Arc;

use catalog_matcher::db::{establish_connection_pool, init_schema};
use catalog_matcher::models::config::ServerConfig;
use catalog_matcher::processing::ZMQMessage;
use catalog_matcher::processing::crawler::process_crawler_message;
use catalog_matcher::processing::matching::process_match_message;
use catalog_matcher::repository::DieselRepository;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match ServerConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = pool
        .get()
        .map_err(|e| e.to_string())
        .and_then(|mut conn| init_schema(&mut conn).map_err(|e| e.to_string()))
    {
        log::error!("Failed to initialize database schema: {e}");
        std::process::exit(1);
    }

    let repo = DieselRepository::new(pool, config.embedding_dimensions);

    let context = zmq::Context::new();
    let responder = match context.socket(zmq::PULL) {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("Cannot create zmq socket: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = responder.bind(&config.zmq_address) {
        log::error!("Cannot bind to zmq address {}: {e}", config.zmq_address);
        std::process::exit(1);
    }
    log::info!("Listening on {}", config.zmq_address);

    loop {
        let msg = match responder.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to receive zmq message: {e}");
                continue;
            }
        };
        match serde_json::from_slice::<ZMQMessage>(&msg) {
            Ok(parsed) => {
                let repo = repo.clone();
                let config = Arc::clone(&config);
                tokio::spawn(async move {
                    match parsed {
                        ZMQMessage::Crawl(source) => {
                            process_crawler_message((source, vec![]), repo, config).await
                        }
                        ZMQMessage::CrawlProducts(request) => {
                            process_crawler_message(request, repo, config).await
                        }
                        ZMQMessage::Match(sources) => {
                            process_match_message(sources, repo, config).await
                        }
                    }
                });
            }
            Err(e) => log::error!("Failed to parse JSON: {e}"),
        }
    }
}
