use axum::http::StatusCode;
use fundbook::api;
use fundbook::config::Config;
use fundbook::db::init_db;
use fundbook::domain::{BalanceSnapshot, CapitalEvent, CapitalKind, Client, Decimal, Period, TimeMs};
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
    notifier: Arc<MockNotifier>,
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

    let notifier = Arc::new(MockNotifier::new());
    let closer = Arc::new(MonthCloser::new(
        repo.clone(),
        notifier.clone() as Arc<dyn Notifier>,
    ));
    let feed: Arc<dyn TelemetryFeed> = Arc::new(MockTelemetryFeed::new());
    let state = api::AppState::new(repo.clone(), config, closer, feed);
    let app = api::create_router(state);

    TestApp {
        app,
        repo,
        notifier,
        _temp: temp_dir,
    }
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn seed_client(repo: &fundbook::Repository, name: &str) -> Client {
    let client = Client::new(
        name.into(),
        format!("{}@example.com", name.to_lowercase()),
        None,
        Decimal::from_str("0.5").unwrap(),
        Decimal::from_int(1000),
    );
    repo.insert_client(&client).await.unwrap();
    client
}

/// Prior month balance 1000, a 500 deposit mid-month, closing 1600:
/// gross 100, fee 50 at a 0.5 share.
async fn seed_worked_scenario(repo: &fundbook::Repository, client: &Client, period: Period) {
    let start = period.start_ms().as_ms();
    repo.insert_balance_snapshot(&BalanceSnapshot::new(
        client.id.clone(),
        Decimal::from_int(1000),
        None,
        TimeMs::new(start - 86_400_000),
    ))
    .await
    .unwrap();
    repo.insert_capital_event(&CapitalEvent::new(
        client.id.clone(),
        CapitalKind::Deposit,
        Decimal::from_int(500),
        None,
        TimeMs::new(start + 5 * 86_400_000),
        None,
        None,
    ))
    .await
    .unwrap();
    repo.insert_balance_snapshot(&BalanceSnapshot::new(
        client.id.clone(),
        Decimal::from_int(1600),
        None,
        TimeMs::new(start + 20 * 86_400_000),
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn test_close_produces_snapshot_and_sends_report() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo, "Alice").await;
    let period = Period::new(2025, 7).unwrap();
    seed_worked_scenario(&test_app.repo, &client, period).await;

    let (status, json) = post_json(
        test_app.app.clone(),
        "/v1/close",
        serde_json::json!({"year": 2025, "month": 7}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["period"], "2025-07");

    let result = &json["results"][0];
    assert_eq!(result["clientId"], client.id.as_str());
    assert_eq!(result["outcome"], "closed");
    assert_eq!(result["reportSent"], true);
    assert_eq!(result["identityOk"], true);

    let snapshot = &result["snapshot"];
    assert_eq!(snapshot["openingBalance"], 1000.0);
    assert_eq!(snapshot["closingBalance"], 1600.0);
    assert_eq!(snapshot["netNewCapital"], 500.0);
    assert_eq!(snapshot["grossPnl"], 100.0);
    assert_eq!(snapshot["performanceFee"], 50.0);
    assert_eq!(snapshot["openingSource"], "prior_period");

    let sent = test_app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, client.contact);
    assert!(sent[0].subject.contains("2025-07"));
}

#[tokio::test]
async fn test_second_close_is_idempotent() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo, "Alice").await;
    let period = Period::new(2025, 7).unwrap();
    seed_worked_scenario(&test_app.repo, &client, period).await;

    let body = serde_json::json!({"year": 2025, "month": 7});
    let (status, _) = post_json(test_app.app.clone(), "/v1/close", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(test_app.app.clone(), "/v1/close", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["outcome"], "skippedAlreadySent");

    // No second statement went out.
    assert_eq!(test_app.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_close_skips_client_without_balance_data() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo, "Alice").await;

    let (status, json) = post_json(
        test_app.app.clone(),
        "/v1/close",
        serde_json::json!({"year": 2025, "month": 7, "clientId": client.id.as_str()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["outcome"], "skippedDataGap");
    assert!(test_app.notifier.sent().is_empty());

    let stored = test_app
        .repo
        .get_monthly_snapshot(&client.id, Period::new(2025, 7).unwrap())
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_close_rejects_invalid_month_and_unknown_client() {
    let test_app = setup_test_app().await;

    let (status, _) = post_json(
        test_app.app.clone(),
        "/v1/close",
        serde_json::json!({"year": 2025, "month": 13}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        test_app.app.clone(),
        "/v1/close",
        serde_json::json!({"year": 2025, "month": 7, "clientId": "missing"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fee_payment_settles_closed_period() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo, "Alice").await;
    let period = Period::new(2025, 7).unwrap();
    seed_worked_scenario(&test_app.repo, &client, period).await;

    let (status, _) = post_json(
        test_app.app.clone(),
        "/v1/close",
        serde_json::json!({"year": 2025, "month": 7}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Fee is 50; pay 30, then the remaining 20.
    let (status, json) = post_json(
        test_app.app.clone(),
        "/v1/fees/payments",
        serde_json::json!({
            "clientId": client.id.as_str(),
            "year": 2025,
            "month": 7,
            "amount": "30",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalPaid"], "30");
    assert_eq!(json["outstanding"], "20");
    assert_eq!(json["fullySettled"], false);

    let (status, json) = post_json(
        test_app.app.clone(),
        "/v1/fees/payments",
        serde_json::json!({
            "clientId": client.id.as_str(),
            "year": 2025,
            "month": 7,
            "amount": "20",
            "reference": "BANK-77",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fullySettled"], true);
    assert_eq!(json["outstanding"], "0");
}
