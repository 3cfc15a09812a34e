#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use aiapp_relay::DifyClient;
use aiapp_server::api::AppState;
use aiapp_server::config::ServerConfig;
use aiapp_server::registry::AppRegistry;
use aiapp_server::router;
use axum::http::{Method, header};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aiapp_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting AiApp relay server");

    let config = ServerConfig::load().expect("Failed to load configuration");
    let registry = AppRegistry::new(config.apps.clone());
    if registry.is_empty() {
        tracing::warn!("no apps configured; every relay request will fail app resolution");
    }

    let state = AppState::new(registry, DifyClient::new(&config.dify_base_url));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .unwrap_or_else(|err| panic!("Failed to bind to {}:{}: {err}", config.host, config.port));

    tracing::info!(
        "AiApp relay running on http://{}:{} (upstream {})",
        config.host,
        config.port,
        config.dify_base_url
    );

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
