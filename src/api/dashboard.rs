use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{BalanceSnapshot, ClientId, Decimal, MonthStats, Period, TimeMs};
use crate::engine::compute_stats;
use crate::error::AppError;
use crate::live::Staleness;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub client_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub client_id: String,
    pub period: String,
    /// Provisional month-to-date figures; the month close is authoritative.
    pub advisory: bool,
    /// No balance observed inside the open period; the closing figure is
    /// the prior close carried forward.
    pub data_gap: bool,
    pub stats: MonthStats,
    pub carried_loss_in: String,
    pub staleness: Staleness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Month-to-date view of the current open period. Uses live equity as the
/// closing-balance proxy when telemetry is available; falls back to the
/// latest ledger snapshot (marked stale) when it is not.
pub async fn get_dashboard(
    Query(params): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let client_id = ClientId::new(params.client_id);
    let client = state
        .repo
        .get_client(&client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {}", client_id)))?;

    let now = TimeMs::now();
    let period = Period::containing(now);
    let start = period.start_ms();

    let mut balances = state.repo.snapshots_in_range(&client.id, start, now).await?;
    let prior = state.repo.last_snapshot_before(&client.id, start).await?;
    let capital_events = state
        .repo
        .capital_events_in_range(&client.id, start, now)
        .await?;
    let trades = state
        .repo
        .closed_trades_in_range(&client.id, start, now)
        .await?;
    // Same derivation as the close pipeline: the loss entering this period
    // is the latest *prior* snapshot's carried_loss_out. A snapshot already
    // written for the open period must not feed its own output back in.
    let carried_loss_in = state
        .repo
        .latest_snapshot_before(&client.id, period)
        .await?
        .map(|s| s.stats.carried_loss_out)
        .unwrap_or_else(Decimal::zero);

    let mut position = None;
    let mut last_update = None;
    if let Some(account) = &client.trading_account {
        match state.feed.fetch_status(account).await {
            Ok(Some(status)) => {
                // Equity stands in for the closing balance mid-month.
                balances.push(BalanceSnapshot::new(
                    client.id.clone(),
                    status.current_equity,
                    Some(status.current_equity),
                    status.last_update,
                ));
                position = status.position;
                last_update = Some(status.last_update);
            }
            Ok(None) => {
                tracing::warn!(client_id = %client.id, account = %account, "no telemetry for account");
            }
            Err(e) => {
                tracing::warn!(client_id = %client.id, error = %e, "telemetry fetch failed");
            }
        }
    }

    // Nothing observed in-period and no live figure either. Computing on an
    // empty window would report the whole account as lost; carry the prior
    // close forward (flat month, marked as a gap) or refuse outright.
    let data_gap = balances.is_empty();
    if data_gap {
        match &prior {
            Some(p) => {
                tracing::warn!(
                    client_id = %client.id,
                    period = %period.label(),
                    "no balance data for open period, carrying prior close forward"
                );
                balances.push(BalanceSnapshot::new(
                    client.id.clone(),
                    p.balance,
                    p.equity,
                    p.time_ms,
                ));
            }
            None => {
                return Err(AppError::NotFound(format!(
                    "no balance history for client {}",
                    client.id
                )));
            }
        }
    }

    let staleness = match last_update {
        Some(at) => Staleness::classify(
            now,
            at,
            state.config.staleness_fresh_ms,
            state.config.staleness_delayed_ms,
        ),
        None => Staleness::Stale,
    };

    let stats = compute_stats(
        &trades,
        &balances,
        &capital_events,
        carried_loss_in,
        client.profit_share,
        prior.map(|p| p.balance),
    );

    Ok(Json(DashboardResponse {
        client_id: client.id.as_str().to_string(),
        period: period.label(),
        advisory: true,
        data_gap,
        stats,
        carried_loss_in: carried_loss_in.to_canonical_string(),
        staleness,
        last_update_ms: last_update.map(|t| t.as_ms()),
        position,
    }))
}
