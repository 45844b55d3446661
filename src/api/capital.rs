use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{AuditKind, CapitalEvent, CapitalKind, ClientId, Decimal, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    pub client_id: String,
    /// "DEPOSIT" or "WITHDRAWAL".
    pub kind: String,
    pub amount: String,
    pub note: Option<String>,
    /// When the money moved; defaults to now.
    pub occurred_at_ms: Option<i64>,
    pub recorded_by: Option<String>,
    /// Bank/exchange reference. When present it becomes the event key,
    /// so replaying the same transfer is a no-op.
    pub external_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub client_id: String,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventResponse {
    pub event: CapitalEvent,
    /// False when the event key already existed and nothing was written.
    pub recorded: bool,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub net_capital: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsResponse {
    pub events: Vec<CapitalEvent>,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub net_capital: String,
}

pub async fn record_event(
    State(state): State<AppState>,
    Json(req): Json<RecordEventRequest>,
) -> Result<Json<RecordEventResponse>, AppError> {
    let client_id = ClientId::new(req.client_id);
    let client = state
        .repo
        .get_client(&client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {}", client_id)))?;

    let kind = CapitalKind::parse(&req.kind)
        .ok_or_else(|| AppError::Validation("kind must be DEPOSIT or WITHDRAWAL".into()))?;
    let amount = Decimal::from_str(&req.amount)
        .map_err(|_| AppError::Validation("amount must be a decimal".into()))?;
    if !amount.is_positive() {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let occurred_at = req.occurred_at_ms.map(TimeMs::new).unwrap_or_else(TimeMs::now);
    let mut event = CapitalEvent::new(
        client.id.clone(),
        kind,
        amount,
        req.note,
        occurred_at,
        req.recorded_by,
        req.external_ref,
    );

    // Best-effort balance context for the audit trail; absence is fine.
    if let Some(before) = state
        .repo
        .last_snapshot_before(&client.id, TimeMs::now())
        .await?
    {
        event.balance_before = Some(before.balance);
        event.balance_after = Some(before.balance + event.signed_amount());
    }

    let recorded = state.repo.insert_capital_event(&event).await?;
    if recorded {
        state
            .repo
            .append_audit(
                &client.id,
                AuditKind::CapitalEvent,
                event.recorded_at,
                &serde_json::json!({
                    "eventKey": event.event_key,
                    "kind": event.kind.to_string(),
                    "signedAmount": event.signed_amount().to_canonical_string(),
                    "balanceBefore": event.balance_before.map(|d| d.to_canonical_string()),
                    "balanceAfter": event.balance_after.map(|d| d.to_canonical_string()),
                }),
            )
            .await?;
        tracing::info!(
            client_id = %client.id,
            event_key = %event.event_key,
            kind = %event.kind,
            amount = %event.amount,
            "capital event recorded"
        );
    } else {
        tracing::info!(
            client_id = %client.id,
            event_key = %event.event_key,
            "duplicate capital event ignored"
        );
    }

    let (total_deposited, total_withdrawn) = state.repo.capital_totals(&client.id).await?;
    Ok(Json(RecordEventResponse {
        event,
        recorded,
        net_capital: (total_deposited - total_withdrawn).to_canonical_string(),
        total_deposited: total_deposited.to_canonical_string(),
        total_withdrawn: total_withdrawn.to_canonical_string(),
    }))
}

pub async fn list_events(
    Query(params): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, AppError> {
    let client_id = ClientId::new(params.client_id);
    if state.repo.get_client(&client_id).await?.is_none() {
        return Err(AppError::NotFound(format!("client {}", client_id)));
    }

    let from = TimeMs::new(params.from_ms.unwrap_or(0));
    let to = TimeMs::new(params.to_ms.unwrap_or(i64::MAX));
    if from > to {
        return Err(AppError::Validation("fromMs must be <= toMs".into()));
    }

    let events = state
        .repo
        .capital_events_in_range(&client_id, from, to)
        .await?;
    let (total_deposited, total_withdrawn) = state.repo.capital_totals(&client_id).await?;

    Ok(Json(ListEventsResponse {
        events,
        net_capital: (total_deposited - total_withdrawn).to_canonical_string(),
        total_deposited: total_deposited.to_canonical_string(),
        total_withdrawn: total_withdrawn.to_canonical_string(),
    }))
}
