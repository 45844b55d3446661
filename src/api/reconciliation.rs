use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::ClientId;
use crate::engine::{check_continuity, Finding};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationQuery {
    /// Restrict to one client; omitted means fund-wide.
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResponse {
    pub clients_checked: usize,
    pub findings: Vec<Finding>,
}

/// Cross-period continuity check over persisted snapshots. Advisory only;
/// findings point at likely missing capital events or snapshot anomalies.
pub async fn get_findings(
    Query(params): Query<ReconciliationQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReconciliationResponse>, AppError> {
    let client_ids: Vec<ClientId> = match params.client_id {
        Some(id) => {
            let client_id = ClientId::new(id);
            if state.repo.get_client(&client_id).await?.is_none() {
                return Err(AppError::NotFound(format!("client {}", client_id)));
            }
            vec![client_id]
        }
        None => state
            .repo
            .list_clients(false)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect(),
    };

    let clients_checked = client_ids.len();
    let mut findings = Vec::new();
    for client_id in &client_ids {
        let snapshots = state.repo.list_monthly_snapshots(client_id).await?;
        findings.extend(check_continuity(&snapshots));
    }

    Ok(Json(ReconciliationResponse {
        clients_checked,
        findings,
    }))
}
