use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{AuditLogEntry, Client, ClientId, Decimal};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    pub contact: String,
    pub trading_account: Option<String>,
    /// Operator's share of net profit as a decimal string, e.g. "0.5".
    pub profit_share: Option<String>,
    pub initial_capital: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClientsQuery {
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    #[serde(flatten)]
    pub client: Client,
    /// Derived from the latest monthly snapshot, never stored on the client.
    pub carried_loss: String,
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(req): Json<CreateClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if req.contact.trim().is_empty() {
        return Err(AppError::Validation("contact must not be empty".into()));
    }

    let profit_share = match &req.profit_share {
        Some(s) => Decimal::from_str(s)
            .map_err(|_| AppError::Validation("profitShare must be a decimal".into()))?,
        None => state.config.default_profit_share,
    };
    if profit_share.is_negative() || profit_share > Decimal::from_int(1) {
        return Err(AppError::Validation(
            "profitShare must be between 0 and 1".into(),
        ));
    }

    let initial_capital = match &req.initial_capital {
        Some(s) => Decimal::from_str(s)
            .map_err(|_| AppError::Validation("initialCapital must be a decimal".into()))?,
        None => Decimal::zero(),
    };
    if initial_capital.is_negative() {
        return Err(AppError::Validation(
            "initialCapital must not be negative".into(),
        ));
    }

    let client = Client::new(
        req.name.trim().to_string(),
        req.contact.trim().to_string(),
        req.trading_account,
        profit_share,
        initial_capital,
    );
    state.repo.insert_client(&client).await?;
    tracing::info!(client_id = %client.id, "client onboarded");

    Ok(Json(ClientResponse {
        client,
        carried_loss: Decimal::zero().to_canonical_string(),
    }))
}

pub async fn list_clients(
    Query(params): Query<ListClientsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Client>>, AppError> {
    let clients = state
        .repo
        .list_clients(params.active_only.unwrap_or(false))
        .await?;
    Ok(Json(clients))
}

pub async fn get_client(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ClientResponse>, AppError> {
    let client_id = ClientId::new(id);
    let client = state
        .repo
        .get_client(&client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {}", client_id)))?;
    let carried_loss = state.repo.current_carried_loss(&client_id).await?;

    Ok(Json(ClientResponse {
        client,
        carried_loss: carried_loss.to_canonical_string(),
    }))
}

pub async fn set_active(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client_id = ClientId::new(id);
    let updated = state.repo.set_client_active(&client_id, req.active).await?;
    if !updated {
        return Err(AppError::NotFound(format!("client {}", client_id)));
    }
    tracing::info!(client_id = %client_id, active = req.active, "client activation changed");
    Ok(Json(
        serde_json::json!({"clientId": client_id.as_str(), "active": req.active}),
    ))
}

pub async fn get_audit(
    Path(id): Path<String>,
    Query(params): Query<AuditQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    let client_id = ClientId::new(id);
    if state.repo.get_client(&client_id).await?.is_none() {
        return Err(AppError::NotFound(format!("client {}", client_id)));
    }
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let entries = state.repo.audit_entries(&client_id, limit).await?;
    Ok(Json(entries))
}
