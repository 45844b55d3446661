use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{ClientId, MonthlySnapshot, Period};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsQuery {
    pub client_id: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsResponse {
    pub client_id: String,
    pub snapshots: Vec<MonthlySnapshot>,
}

/// Persisted monthly snapshots: the full history, or a single period when
/// both `year` and `month` are given.
pub async fn get_reports(
    Query(params): Query<ReportsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReportsResponse>, AppError> {
    let client_id = ClientId::new(params.client_id);
    if state.repo.get_client(&client_id).await?.is_none() {
        return Err(AppError::NotFound(format!("client {}", client_id)));
    }

    let snapshots = match (params.year, params.month) {
        (Some(year), Some(month)) => {
            let period = Period::new(year, month)
                .ok_or_else(|| AppError::Validation("month must be between 1 and 12".into()))?;
            let snapshot = state
                .repo
                .get_monthly_snapshot(&client_id, period)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "no report for client {} in {}",
                        client_id,
                        period.label()
                    ))
                })?;
            vec![snapshot]
        }
        (None, None) => state.repo.list_monthly_snapshots(&client_id).await?,
        _ => {
            return Err(AppError::Validation(
                "year and month must be provided together".into(),
            ))
        }
    };

    Ok(Json(ReportsResponse {
        client_id: client_id.as_str().to_string(),
        snapshots,
    }))
}
