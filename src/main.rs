use std::sync::Arc;

use axum::{routing::get, Router};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkcard::config::Config;
use linkcard::handlers;
use linkcard::preview::fetcher::ReqwestFetcher;
use linkcard::preview::PreviewExtractor;
use linkcard::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing: JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linkcard=info,tower_http=info"));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Linkcard server starting...");

    let config = Config::from_env().expect("Failed to load configuration");
    info!(
        timeout_ms = config.preview_timeout.as_millis() as u64,
        body_image_limit = config.body_image_scan_limit,
        block_private_hosts = config.block_private_hosts,
        "Configuration loaded"
    );

    let fetcher = ReqwestFetcher::new(&config.user_agent, config.block_private_hosts)
        .expect("Failed to build HTTP client");

    let app_state = AppState {
        extractor: PreviewExtractor::new(Arc::new(fetcher), config.preview_options()),
    };

    // CORS: permissive in dev, restrictive in production.
    let cors = if config.is_dev {
        info!("CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        tracing::warn!("CORS: restrictive (production mode). Cross-origin requests will be denied.");
        CorsLayer::new()
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .route(
            "/link-preview",
            get(handlers::link_preview::get_link_preview)
                .post(handlers::link_preview::post_link_preview),
        )
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .layer(cors)
        .with_state(app_state);

    let addr = config.server_addr();
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
