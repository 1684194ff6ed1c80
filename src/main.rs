use std::sync::Arc;

use sample_series::{
    api, logging, metrics,
    storage::MemorySampleRepository,
    ServerConfig,
};
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logger(env!("CARGO_CRATE_NAME")) {
        eprintln!("{}", e);
    }

    metrics::init_metrics();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let repository = Arc::new(MemorySampleRepository::new());
    if let Err(e) = api::start_server(config, repository).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
