pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod live;
pub mod notify;
pub mod pipeline;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    BalanceSnapshot, CapitalEvent, CapitalKind, Client, ClientId, Decimal, MonthStats,
    MonthlySnapshot, OpeningSource, Period, Side, TimeMs, Trade,
};
pub use error::AppError;
pub use live::{HttpTelemetryFeed, MockTelemetryFeed, Staleness, TelemetryFeed};
pub use notify::{MockNotifier, Notifier, WebhookNotifier};
pub use pipeline::MonthCloser;
