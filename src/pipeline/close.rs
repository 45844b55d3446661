//! Per-client month-close run.
//!
//! Single pass per client: read-before-compute idempotency gate, data-gap
//! skip, stats computation, advisory reconciliation, idempotent snapshot
//! persistence, report delivery, and the report-sent marker. Clients are
//! independent; a failure for one never aborts the run for the rest.

use crate::db::Repository;
use crate::domain::{AuditKind, Client, ClientId, Decimal, MonthlySnapshot, Period, TimeMs};
use crate::engine::{check_identity, compute_stats};
use crate::notify::Notifier;
use crate::pipeline::render::{render_statement, statement_subject};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Outcome of a close attempt for one client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCloseOutcome {
    /// Snapshot persisted. `report_sent` is false when delivery failed;
    /// the next run retries delivery without drifting the figures.
    Closed {
        snapshot: MonthlySnapshot,
        report_sent: bool,
        identity_ok: bool,
    },
    /// The period was already closed and the report delivered.
    SkippedAlreadySent,
    /// No balance history for the period: nothing trustworthy to publish.
    SkippedDataGap,
    /// The close attempt errored. Recorded in the run report; the other
    /// clients in the run are unaffected.
    Failed { error: String },
}

/// One client's result within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientCloseReport {
    pub client_id: ClientId,
    pub outcome: ClientCloseOutcome,
}

#[derive(Debug, Error)]
pub enum CloseError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Runs the month-close pipeline.
pub struct MonthCloser {
    repo: Arc<Repository>,
    notifier: Arc<dyn Notifier>,
}

impl MonthCloser {
    pub fn new(repo: Arc<Repository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Close a period for every active client.
    pub async fn close_period(&self, period: Period) -> Result<Vec<ClientCloseReport>, CloseError> {
        let clients = self.repo.list_clients(true).await?;
        let mut reports = Vec::with_capacity(clients.len());
        for client in &clients {
            let outcome = match self.close_client(client, period).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        client = %client.id,
                        period = %period,
                        error = %e,
                        "close failed for client, continuing with the rest"
                    );
                    ClientCloseOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            reports.push(ClientCloseReport {
                client_id: client.id.clone(),
                outcome,
            });
        }
        Ok(reports)
    }

    /// Close a period for one client.
    pub async fn close_client(
        &self,
        client: &Client,
        period: Period,
    ) -> Result<ClientCloseOutcome, CloseError> {
        let existing = self.repo.get_monthly_snapshot(&client.id, period).await?;

        // Idempotency gate: a delivered period is terminal for this pipeline.
        if let Some(snap) = &existing {
            if snap.report_sent_at.is_some() {
                info!(client = %client.id, period = %period, "report already sent, skipping");
                return Ok(ClientCloseOutcome::SkippedAlreadySent);
            }
        }

        let start = period.start_ms();
        let end = period.end_ms();
        let balances = self.repo.snapshots_in_range(&client.id, start, end).await?;
        let prior = self.repo.last_snapshot_before(&client.id, start).await?;

        if balances.is_empty() {
            // Likely a telemetry sync outage; the next run retries. A zero
            // report would be worse than no report.
            warn!(
                client = %client.id,
                period = %period,
                "no balance history for period, skipping close (possible sync outage)"
            );
            return Ok(ClientCloseOutcome::SkippedDataGap);
        }

        let capital_events = self
            .repo
            .capital_events_in_range(&client.id, start, end)
            .await?;
        let trades = self.repo.closed_trades_in_range(&client.id, start, end).await?;

        // Retry safety: a partially-closed period already holds the loss it
        // consumed; re-deriving from history would deduct it twice.
        let carried_loss_in = match &existing {
            Some(snap) => snap.stats.carried_loss_in,
            None => self.derived_carried_loss(&client.id, period).await?,
        };

        let stats = compute_stats(
            &trades,
            &balances,
            &capital_events,
            carried_loss_in,
            client.profit_share,
            prior.map(|p| p.balance),
        );

        let identity_ok = check_identity(&client.id, period, &stats).is_none();

        let snapshot = MonthlySnapshot::computed(client.id.clone(), period, stats);
        self.repo.upsert_monthly_snapshot(&snapshot).await?;
        self.repo
            .append_audit(
                &client.id,
                AuditKind::MonthClosed,
                TimeMs::now(),
                &serde_json::json!({
                    "period": period.label(),
                    "grossPnl": snapshot.stats.gross_pnl.to_canonical_string(),
                    "performanceFee": snapshot.stats.performance_fee.to_canonical_string(),
                    "carriedLossOut": snapshot.stats.carried_loss_out.to_canonical_string(),
                    "identityOk": identity_ok,
                }),
            )
            .await?;

        let report_sent = self.deliver_report(client, &snapshot).await?;

        let snapshot = self
            .repo
            .get_monthly_snapshot(&client.id, period)
            .await?
            .unwrap_or(snapshot);

        info!(
            client = %client.id,
            period = %period,
            gross_pnl = %snapshot.stats.gross_pnl,
            fee = %snapshot.stats.performance_fee,
            report_sent,
            "period closed"
        );

        Ok(ClientCloseOutcome::Closed {
            snapshot,
            report_sent,
            identity_ok,
        })
    }

    /// Deliver the statement; on failure leave the marker unset so the next
    /// run retries delivery against the already-persisted snapshot.
    async fn deliver_report(
        &self,
        client: &Client,
        snapshot: &MonthlySnapshot,
    ) -> Result<bool, CloseError> {
        let document = render_statement(client, snapshot);
        let subject = statement_subject(snapshot.period);

        match self.notifier.send(&client.contact, &subject, &document).await {
            Ok(()) => {
                let sent_at = TimeMs::now();
                self.repo
                    .mark_report_sent(&client.id, snapshot.period, sent_at, &client.contact)
                    .await?;
                self.repo
                    .append_audit(
                        &client.id,
                        AuditKind::ReportSent,
                        sent_at,
                        &serde_json::json!({
                            "period": snapshot.period.label(),
                            "recipient": client.contact,
                        }),
                    )
                    .await?;
                Ok(true)
            }
            Err(e) => {
                warn!(
                    client = %client.id,
                    period = %snapshot.period,
                    error = %e,
                    "report delivery failed, marker left unset for retry"
                );
                Ok(false)
            }
        }
    }

    /// Carried loss entering a fresh period: the latest prior snapshot's
    /// carried_loss_out, zero with no history.
    async fn derived_carried_loss(
        &self,
        client_id: &ClientId,
        period: Period,
    ) -> Result<Decimal, CloseError> {
        Ok(self
            .repo
            .latest_snapshot_before(client_id, period)
            .await?
            .map(|s| s.stats.carried_loss_out)
            .unwrap_or_else(Decimal::zero))
    }
}
