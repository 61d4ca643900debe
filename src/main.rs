use axum::{Router, http::header, routing::get};
use splitledger::api::{
    AppState,
    handlers::{api_routes, health},
    idempotency::IDEMPOTENCY_KEY,
    openapi::ApiDoc,
};
use splitledger::config::CONFIG;
use splitledger::core::services::LedgerService;
use splitledger::infrastructure::{cache::in_memory::InMemoryIdempotencyStore, storage::in_memory::InMemoryStorage};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState {
        service: Arc::new(LedgerService::new(InMemoryStorage::new(), CONFIG.default_currency)),
        idempotency: Arc::new(InMemoryIdempotencyStore::new()),
        idempotency_ttl: CONFIG.idempotency_ttl,
    };

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/health", get(health))
        .nest("/api", api_routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(CONFIG.request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, IDEMPOTENCY_KEY]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!(
        "Server running at http://{} (default currency {})",
        addr, CONFIG.default_currency
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
