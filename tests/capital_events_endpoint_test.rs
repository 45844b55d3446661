use axum::http::StatusCode;
use fundbook::api;
use fundbook::config::Config;
use fundbook::db::init_db;
use fundbook::domain::{Client, Decimal};
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
        Decimal::from_int(10_000),
    );
    repo.insert_client(&client).await.unwrap();
    client
}

#[tokio::test]
async fn test_deposit_updates_running_totals() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;

    let (status, json) = post_json(
        test_app.app.clone(),
        "/v1/capital-events",
        serde_json::json!({
            "clientId": client.id.as_str(),
            "kind": "DEPOSIT",
            "amount": "500",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recorded"], true);
    assert_eq!(json["totalDeposited"], "500");
    assert_eq!(json["totalWithdrawn"], "0");
    assert_eq!(json["netCapital"], "500");
    assert_eq!(json["event"]["kind"], "DEPOSIT");

    let (status, json) = post_json(
        test_app.app.clone(),
        "/v1/capital-events",
        serde_json::json!({
            "clientId": client.id.as_str(),
            "kind": "WITHDRAWAL",
            "amount": "200",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalDeposited"], "500");
    assert_eq!(json["totalWithdrawn"], "200");
    assert_eq!(json["netCapital"], "300");
}

#[tokio::test]
async fn test_duplicate_external_ref_is_ignored() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;

    let body = serde_json::json!({
        "clientId": client.id.as_str(),
        "kind": "DEPOSIT",
        "amount": "500",
        "externalRef": "WIRE-2025-0042",
    });
    let (status, json) = post_json(test_app.app.clone(), "/v1/capital-events", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recorded"], true);

    // Same wire reference replayed: no new row, totals unchanged.
    let (status, json) = post_json(test_app.app.clone(), "/v1/capital-events", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recorded"], false);
    assert_eq!(json["totalDeposited"], "500");
    assert_eq!(json["event"]["eventKey"], "wire-2025-0042");
}

#[tokio::test]
async fn test_validation_rejections() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;

    let (status, _) = post_json(
        test_app.app.clone(),
        "/v1/capital-events",
        serde_json::json!({
            "clientId": client.id.as_str(),
            "kind": "TRANSFER",
            "amount": "500",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        test_app.app.clone(),
        "/v1/capital-events",
        serde_json::json!({
            "clientId": client.id.as_str(),
            "kind": "DEPOSIT",
            "amount": "-500",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        test_app.app.clone(),
        "/v1/capital-events",
        serde_json::json!({
            "clientId": "missing-client",
            "kind": "DEPOSIT",
            "amount": "500",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_events_in_window() {
    let test_app = setup_test_app().await;
    let client = seed_client(&test_app.repo).await;

    for (amount, at) in [("100", 1_000i64), ("200", 2_000), ("300", 3_000)] {
        let (status, _) = post_json(
            test_app.app.clone(),
            "/v1/capital-events",
            serde_json::json!({
                "clientId": client.id.as_str(),
                "kind": "DEPOSIT",
                "amount": amount,
                "occurredAtMs": at,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = get_json(
        test_app.app.clone(),
        &format!(
            "/v1/capital-events?clientId={}&fromMs=1500&toMs=2500",
            client.id.as_str()
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["amount"], 200.0);
    // Totals stay all-time regardless of the window.
    assert_eq!(json["totalDeposited"], "600");
}
