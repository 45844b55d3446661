use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{AuditKind, ClientId, Decimal, Period, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub client_id: String,
    pub year: i32,
    pub month: u32,
    pub amount: String,
    /// External payment reference, e.g. a bank transaction id.
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentResponse {
    pub client_id: String,
    pub period: String,
    pub total_paid: String,
    pub outstanding: String,
    pub fully_settled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub earned: String,
    pub paid: String,
    pub outstanding: String,
}

pub async fn record_payment(
    State(state): State<AppState>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Json<RecordPaymentResponse>, AppError> {
    let client_id = ClientId::new(req.client_id);
    if state.repo.get_client(&client_id).await?.is_none() {
        return Err(AppError::NotFound(format!("client {}", client_id)));
    }
    let period = Period::new(req.year, req.month)
        .ok_or_else(|| AppError::Validation("month must be between 1 and 12".into()))?;
    let amount = Decimal::from_str(&req.amount)
        .map_err(|_| AppError::Validation("amount must be a decimal".into()))?;
    if !amount.is_positive() {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let before = state
        .repo
        .get_monthly_snapshot(&client_id, period)
        .await?
        .map(|s| s.fee_paid);

    let paid_at = TimeMs::now();
    let receipt = state
        .repo
        .record_fee_payment(&client_id, period, amount, req.reference.as_deref(), paid_at)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no closed period {} for client {}",
                period.label(),
                client_id
            ))
        })?;

    state
        .repo
        .append_audit(
            &client_id,
            AuditKind::FeePayment,
            paid_at,
            &serde_json::json!({
                "period": period.label(),
                "amount": amount.to_canonical_string(),
                "feePaidBefore": before.map(|d| d.to_canonical_string()),
                "feePaidAfter": receipt.total_paid.to_canonical_string(),
                "reference": req.reference,
            }),
        )
        .await?;
    tracing::info!(
        client_id = %client_id,
        period = %period.label(),
        amount = %amount,
        fully_settled = receipt.fully_settled,
        "fee payment recorded"
    );

    Ok(Json(RecordPaymentResponse {
        client_id: client_id.as_str().to_string(),
        period: period.label(),
        total_paid: receipt.total_paid.to_canonical_string(),
        outstanding: receipt.outstanding.to_canonical_string(),
        fully_settled: receipt.fully_settled,
    }))
}

pub async fn get_summary(
    Query(params): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, AppError> {
    let client_id = params.client_id.map(ClientId::new);
    if let Some(id) = &client_id {
        if state.repo.get_client(id).await?.is_none() {
            return Err(AppError::NotFound(format!("client {}", id)));
        }
    }

    let totals = state.repo.fee_totals(client_id.as_ref()).await?;
    Ok(Json(SummaryResponse {
        client_id: client_id.map(|id| id.as_str().to_string()),
        earned: totals.earned.to_canonical_string(),
        paid: totals.paid.to_canonical_string(),
        outstanding: totals.outstanding.to_canonical_string(),
    }))
}
