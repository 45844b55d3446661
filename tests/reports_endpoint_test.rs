use axum::http::StatusCode;
use fundbook::api;
use fundbook::config::Config;
use fundbook::db::init_db;
use fundbook::domain::{BalanceSnapshot, Client, Decimal, MonthlySnapshot, Period, TimeMs};
use fundbook::engine::compute_stats;
use fundbook::live::{MockTelemetryFeed, TelemetryFeed};
use fundbook::notify::{MockNotifier, Notifier};
use fundbook::pipeline::MonthCloser;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<fundbook::Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(fundbook::Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        telemetry_api_url: "http://example.invalid".to_string(),
        notify_webhook_url: "http://example.invalid/deliver".to_string(),
        default_profit_share: Decimal::from_str("0.5").unwrap(),
        staleness_fresh_ms: 300_000,
        staleness_delayed_ms: 480_000,
    };

    let notifier: Arc<dyn Notifier> = Arc::new(MockNotifier::new());
    let closer = Arc::new(MonthCloser::new(repo.clone(), notifier));
    let feed: Arc<dyn TelemetryFeed> = Arc::new(MockTelemetryFeed::new());
    let state = api::AppState::new(repo.clone(), config, closer, feed);
    let app = api::create_router(state);

    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn seed_client(repo: &fundbook::Repository) -> Client {
    let client = Client::new(
        "Alice".into(),
        "alice@example.com".into(),
        None,
        Decimal::from_str("0.5").unwrap(),
        Decimal::from_int(1000),
    );
    repo.insert_client(&client).await.unwrap();
    client
}

async fn seed_month(
    repo: &fundbook::Repository,
    client: &Client,
    period: Period,
    opening: i64,
    closing: i64,
) {
    let start = period.start_ms().as_ms();
    let balances = vec![
        BalanceSnapshot::new(
            client.id.clone(),
            Decimal::from_int(opening),
            None,
            TimeMs::new(start + 1000),
        ),
        BalanceSnapshot::new(
            client.id.clone(),
            Decimal::from_int(closing),
            None,
            TimeMs::new(start + 2000),
        ),
    ];
    let stats = compute_stats(
        &[],
        &balances,
        &[],
        Decimal::zero(),
        client.profit_share,
        None,
    );
    repo.upsert_monthly_snapshot(&MonthlySnapshot::computed(client.id.clone(), period, stats))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_history_is_chronological() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;

    seed_month(&test_app.repo, &client, Period::new(2025, 7).unwrap(), 1100, 1200).await;
    seed_month(&test_app.repo, &client, Period::new(2025, 6).unwrap(), 1000, 1100).await;

    let (status, json) = get_json(
        test_app.app.clone(),
        &format!("/v1/reports?clientId={}", client.id.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let snapshots = json["snapshots"].as_array().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0]["period"]["month"], 6);
    assert_eq!(snapshots[1]["period"]["month"], 7);
    assert_eq!(snapshots[0]["closingBalance"], 1100.0);
}

#[tokio::test]
async fn test_single_period_lookup() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;
    seed_month(&test_app.repo, &client, Period::new(2025, 6).unwrap(), 1000, 1100).await;

    let (status, json) = get_json(
        test_app.app.clone(),
        &format!("/v1/reports?clientId={}&year=2025&month=6", client.id.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshots"].as_array().unwrap().len(), 1);

    let (status, _) = get_json(
        test_app.app.clone(),
        &format!("/v1/reports?clientId={}&year=2025&month=7", client.id.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_year_and_month_must_pair() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;

    let (status, _) = get_json(
        test_app.app.clone(),
        &format!("/v1/reports?clientId={}&year=2025", client.id.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
