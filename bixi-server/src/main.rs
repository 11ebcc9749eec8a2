use std::sync::Arc;

use bixi_server::cache::FreshnessCache;
use bixi_server::config::ServerConfig;
use bixi_server::facade::BixiService;
use bixi_server::gbfs::{FeedFetcher, HttpFeedFetcher, Language, MockFeedFetcher};
use bixi_server::web::{AppState, Tool, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bixi_server=info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    let fetcher: Arc<dyn FeedFetcher> = match &config.mock_data {
        Some(dir) => {
            let mock = MockFeedFetcher::from_dir(dir).expect("Failed to load mock feeds");
            info!(dir = %dir.display(), feeds = mock.available_feeds().await.len(), "serving mock feeds");
            Arc::new(mock)
        }
        None => {
            info!(base_url = %config.base_url, "using live GBFS feeds");
            Arc::new(HttpFeedFetcher::new(config.fetcher_config()).expect("Failed to create GBFS client"))
        }
    };

    let cache = FreshnessCache::new(fetcher, &config.cache_config());
    let service = BixiService::new(Arc::new(cache));

    // Warm the cache; the server still starts if upstream is down.
    match service.stations(Language::English).await {
        Ok(reply) => info!(stations = reply.data.len(), "loaded station inventory"),
        Err(e) => warn!(error = %e, "could not load station inventory at startup"),
    }

    let app = create_router(AppState::from_service(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind_addr, tools = Tool::ALL.len(), "BIXI tool server listening");
    info!("  GET  /health        - Health check");
    info!("  GET  /tools         - Tool catalogue");
    info!("  POST /tools/{{name}}  - Call a tool with a JSON object of arguments");

    axum::serve(listener, app).await.expect("Server error");
}
