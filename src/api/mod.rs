pub mod capital;
pub mod clients;
pub mod close;
pub mod dashboard;
pub mod fees;
pub mod health;
pub mod reconciliation;
pub mod reports;
pub mod trades;

use crate::config::Config;
use crate::db::Repository;
use crate::live::TelemetryFeed;
use crate::pipeline::MonthCloser;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub closer: Arc<MonthCloser>,
    pub feed: Arc<dyn TelemetryFeed>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        closer: Arc<MonthCloser>,
        feed: Arc<dyn TelemetryFeed>,
    ) -> Self {
        Self {
            repo,
            config,
            closer,
            feed,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/clients",
            post(clients::create_client).get(clients::list_clients),
        )
        .route("/v1/clients/:id", get(clients::get_client))
        .route("/v1/clients/:id/active", put(clients::set_active))
        .route("/v1/clients/:id/audit", get(clients::get_audit))
        .route(
            "/v1/capital-events",
            post(capital::record_event).get(capital::list_events),
        )
        .route("/v1/fees/payments", post(fees::record_payment))
        .route("/v1/fees/summary", get(fees::get_summary))
        .route("/v1/trades", get(trades::get_trades))
        .route("/v1/close", post(close::close_month))
        .route("/v1/reports", get(reports::get_reports))
        .route("/v1/reconciliation", get(reconciliation::get_findings))
        .route("/v1/dashboard", get(dashboard::get_dashboard))
        .layer(cors)
        .with_state(state)
}
