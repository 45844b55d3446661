use fundbook::live::{HttpTelemetryFeed, TelemetryFeed};
use fundbook::notify::{Notifier, WebhookNotifier};
use fundbook::pipeline::MonthCloser;
use fundbook::{api, config::Config, db::init_db, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let feed: Arc<dyn TelemetryFeed> =
        Arc::new(HttpTelemetryFeed::new(config.telemetry_api_url.clone()));
    let notifier: Arc<dyn Notifier> =
        Arc::new(WebhookNotifier::new(config.notify_webhook_url.clone()));
    let closer = Arc::new(MonthCloser::new(repo.clone(), notifier));

    // Create router
    let app = api::create_router(api::AppState::new(repo, config, closer, feed));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
