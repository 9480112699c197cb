use osecure_core::SystemClock;
use osecure_server::{app, auth::OAuthSession, config::ServerConfig};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let session = OAuthSession::from_config(&config, Arc::new(SystemClock))
        .expect("failed to initialize OAuth session");

    let app = app::router(session).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
