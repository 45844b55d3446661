use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{ClientId, MonthlySnapshot, Period};
use crate::error::AppError;
use crate::pipeline::{ClientCloseOutcome, ClientCloseReport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    pub year: i32,
    pub month: u32,
    /// Close a single client instead of all active clients.
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResponse {
    pub period: String,
    pub results: Vec<ClientResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResult {
    pub client_id: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MonthlySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ClientCloseReport> for ClientResult {
    fn from(report: ClientCloseReport) -> Self {
        let client_id = report.client_id.as_str().to_string();
        match report.outcome {
            ClientCloseOutcome::Closed {
                snapshot,
                report_sent,
                identity_ok,
            } => ClientResult {
                client_id,
                outcome: "closed".to_string(),
                report_sent: Some(report_sent),
                identity_ok: Some(identity_ok),
                snapshot: Some(snapshot),
                error: None,
            },
            ClientCloseOutcome::SkippedAlreadySent => ClientResult {
                client_id,
                outcome: "skippedAlreadySent".to_string(),
                report_sent: None,
                identity_ok: None,
                snapshot: None,
                error: None,
            },
            ClientCloseOutcome::SkippedDataGap => ClientResult {
                client_id,
                outcome: "skippedDataGap".to_string(),
                report_sent: None,
                identity_ok: None,
                snapshot: None,
                error: None,
            },
            ClientCloseOutcome::Failed { error } => ClientResult {
                client_id,
                outcome: "failed".to_string(),
                report_sent: None,
                identity_ok: None,
                snapshot: None,
                error: Some(error),
            },
        }
    }
}

pub async fn close_month(
    State(state): State<AppState>,
    Json(req): Json<CloseRequest>,
) -> Result<Json<CloseResponse>, AppError> {
    let period = Period::new(req.year, req.month)
        .ok_or_else(|| AppError::Validation("month must be between 1 and 12".into()))?;

    let reports = match req.client_id {
        Some(id) => {
            let client_id = ClientId::new(id);
            let client = state
                .repo
                .get_client(&client_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("client {}", client_id)))?;
            let outcome = state.closer.close_client(&client, period).await?;
            vec![ClientCloseReport {
                client_id: client.id,
                outcome,
            }]
        }
        None => state.closer.close_period(period).await?,
    };

    Ok(Json(CloseResponse {
        period: period.label(),
        results: reports.into_iter().map(ClientResult::from).collect(),
    }))
}
