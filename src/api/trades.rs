use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{ClientId, TimeMs, Trade};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesQuery {
    pub client_id: String,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    /// Restrict to closed trades (sell with realized P&L).
    pub closed_only: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesResponse {
    pub client_id: String,
    pub trade_count: usize,
    pub trades: Vec<Trade>,
}

/// Raw trade history for display. The calculator never reads from here;
/// it filters closed trades itself.
pub async fn get_trades(
    Query(params): Query<TradesQuery>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let client_id = ClientId::new(params.client_id);
    if state.repo.get_client(&client_id).await?.is_none() {
        return Err(AppError::NotFound(format!("client {}", client_id)));
    }

    let from = TimeMs::new(params.from_ms.unwrap_or(0));
    let to = TimeMs::new(params.to_ms.unwrap_or(i64::MAX));
    if from > to {
        return Err(AppError::Validation("fromMs must be <= toMs".into()));
    }

    let trades = if params.closed_only.unwrap_or(false) {
        state.repo.closed_trades_in_range(&client_id, from, to).await?
    } else {
        state.repo.trades_in_range(&client_id, from, to).await?
    };

    Ok(Json(TradesResponse {
        client_id: client_id.as_str().to_string(),
        trade_count: trades.len(),
        trades,
    }))
}
