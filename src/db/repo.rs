//! Repository layer for ledger and snapshot persistence.

use crate::domain::{
    AuditKind, AuditLogEntry, BalanceSnapshot, CapitalEvent, CapitalKind, Client, ClientId,
    Decimal, MonthStats, MonthlySnapshot, OpeningSource, Period, Side, TimeMs, Trade, TradeStats,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Receipt returned after recording a fee payment.
#[derive(Debug, Clone, PartialEq)]
pub struct FeePaymentReceipt {
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub fully_settled: bool,
}

/// All-time fee aggregates, per client or fund-wide.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeTotals {
    pub earned: Decimal,
    pub paid: Decimal,
    pub outstanding: Decimal,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // ---- clients -----------------------------------------------------------

    pub async fn insert_client(&self, client: &Client) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, name, contact, trading_account, profit_share,
                                 initial_capital, active, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(client.id.as_str())
        .bind(&client.name)
        .bind(&client.contact)
        .bind(client.trading_account.as_deref())
        .bind(client.profit_share.to_canonical_string())
        .bind(client.initial_capital.to_canonical_string())
        .bind(client.active as i32)
        .bind(client.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_client(&self, id: &ClientId) -> Result<Option<Client>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_client(&r)))
    }

    /// List clients, optionally restricted to active ones.
    pub async fn list_clients(&self, active_only: bool) -> Result<Vec<Client>, sqlx::Error> {
        let sql = if active_only {
            "SELECT * FROM clients WHERE active = 1 ORDER BY created_at_ms ASC"
        } else {
            "SELECT * FROM clients ORDER BY created_at_ms ASC"
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_client).collect())
    }

    /// Soft activation toggle; clients are never deleted.
    pub async fn set_client_active(
        &self,
        id: &ClientId,
        active: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE clients SET active = ? WHERE id = ?")
            .bind(active as i32)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- balance ledger ----------------------------------------------------

    pub async fn insert_balance_snapshot(
        &self,
        snapshot: &BalanceSnapshot,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO balance_snapshots (client_id, balance, equity, time_ms) VALUES (?, ?, ?, ?)",
        )
        .bind(snapshot.client_id.as_str())
        .bind(snapshot.balance.to_canonical_string())
        .bind(snapshot.equity.map(|d| d.to_canonical_string()))
        .bind(snapshot.time_ms.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Snapshots within [start, end), ascending by timestamp.
    pub async fn snapshots_in_range(
        &self,
        client_id: &ClientId,
        start: TimeMs,
        end: TimeMs,
    ) -> Result<Vec<BalanceSnapshot>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT client_id, balance, equity, time_ms
            FROM balance_snapshots
            WHERE client_id = ? AND time_ms >= ? AND time_ms < ?
            ORDER BY time_ms ASC, id ASC
            "#,
        )
        .bind(client_id.as_str())
        .bind(start.as_ms())
        .bind(end.as_ms())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_balance).collect())
    }

    /// Latest snapshot strictly before the cutoff, if any.
    pub async fn last_snapshot_before(
        &self,
        client_id: &ClientId,
        cutoff: TimeMs,
    ) -> Result<Option<BalanceSnapshot>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT client_id, balance, equity, time_ms
            FROM balance_snapshots
            WHERE client_id = ? AND time_ms < ?
            ORDER BY time_ms DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(client_id.as_str())
        .bind(cutoff.as_ms())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| row_to_balance(&r)))
    }

    // ---- capital event ledger ----------------------------------------------

    /// Insert a capital event idempotently on its event key.
    ///
    /// Returns true when the event was new.
    pub async fn insert_capital_event(&self, event: &CapitalEvent) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO capital_events (
                event_key, client_id, kind, amount, note, occurred_at_ms,
                recorded_at_ms, recorded_by, balance_before, balance_after
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_key) DO NOTHING
            "#,
        )
        .bind(&event.event_key)
        .bind(event.client_id.as_str())
        .bind(event.kind.to_string())
        .bind(event.amount.to_canonical_string())
        .bind(event.note.as_deref())
        .bind(event.occurred_at.as_ms())
        .bind(event.recorded_at.as_ms())
        .bind(event.recorded_by.as_deref())
        .bind(event.balance_before.map(|d| d.to_canonical_string()))
        .bind(event.balance_after.map(|d| d.to_canonical_string()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Events within [start, end), ordered by occurrence time.
    pub async fn capital_events_in_range(
        &self,
        client_id: &ClientId,
        start: TimeMs,
        end: TimeMs,
    ) -> Result<Vec<CapitalEvent>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM capital_events
            WHERE client_id = ? AND occurred_at_ms >= ? AND occurred_at_ms < ?
            ORDER BY occurred_at_ms ASC, event_key ASC
            "#,
        )
        .bind(client_id.as_str())
        .bind(start.as_ms())
        .bind(end.as_ms())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_capital_event).collect())
    }

    /// All-time running totals: (deposited, withdrawn).
    pub async fn capital_totals(
        &self,
        client_id: &ClientId,
    ) -> Result<(Decimal, Decimal), sqlx::Error> {
        let rows = sqlx::query("SELECT kind, amount FROM capital_events WHERE client_id = ?")
            .bind(client_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut deposited = Decimal::zero();
        let mut withdrawn = Decimal::zero();
        for row in &rows {
            let kind: String = row.get("kind");
            let amount = decimal_column(row, "amount");
            match CapitalKind::parse(&kind) {
                Some(CapitalKind::Deposit) => deposited = deposited + amount,
                Some(CapitalKind::Withdrawal) => withdrawn = withdrawn + amount,
                None => {}
            }
        }
        Ok((deposited, withdrawn))
    }

    // ---- trade ledger ------------------------------------------------------

    pub async fn insert_trade(&self, trade: &Trade) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO trades (client_id, side, price, quantity, notional,
                                pnl, pnl_pct, reason, time_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(trade.client_id.as_str())
        .bind(trade.side.to_string())
        .bind(trade.price.to_canonical_string())
        .bind(trade.quantity.to_canonical_string())
        .bind(trade.notional.to_canonical_string())
        .bind(trade.pnl.map(|d| d.to_canonical_string()))
        .bind(trade.pnl_pct)
        .bind(trade.reason.as_deref())
        .bind(trade.time_ms.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Raw trades within [start, end), for display.
    pub async fn trades_in_range(
        &self,
        client_id: &ClientId,
        start: TimeMs,
        end: TimeMs,
    ) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM trades
            WHERE client_id = ? AND time_ms >= ? AND time_ms < ?
            ORDER BY time_ms ASC, id ASC
            "#,
        )
        .bind(client_id.as_str())
        .bind(start.as_ms())
        .bind(end.as_ms())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_trade).collect())
    }

    /// Closed trades (sell side, non-null pnl) within [start, end).
    pub async fn closed_trades_in_range(
        &self,
        client_id: &ClientId,
        start: TimeMs,
        end: TimeMs,
    ) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM trades
            WHERE client_id = ? AND time_ms >= ? AND time_ms < ?
              AND side = 'sell' AND pnl IS NOT NULL
            ORDER BY time_ms ASC, id ASC
            "#,
        )
        .bind(client_id.as_str())
        .bind(start.as_ms())
        .bind(end.as_ms())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_trade).collect())
    }

    // ---- monthly snapshot store --------------------------------------------

    /// Idempotent upsert keyed on (client, year, month).
    ///
    /// Re-running overwrites the derived fields but preserves fee settlement
    /// and the report-sent marker already recorded for the row.
    pub async fn upsert_monthly_snapshot(
        &self,
        snapshot: &MonthlySnapshot,
    ) -> Result<(), sqlx::Error> {
        let s = &snapshot.stats;
        let t = &s.trades;
        sqlx::query(
            r#"
            INSERT INTO monthly_snapshots (
                client_id, year, month,
                opening_balance, closing_balance, opening_source,
                total_deposits, total_withdrawals, net_new_capital,
                gross_pnl, carried_loss_in, net_pnl, performance_fee, carried_loss_out,
                realized_pnl, unrealized_pnl_change, client_share,
                total_trades, winning_trades, losing_trades, win_rate, profit_factor,
                best_trade_pnl, worst_trade_pnl, avg_win, avg_loss,
                computed_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(client_id, year, month) DO UPDATE SET
                opening_balance = excluded.opening_balance,
                closing_balance = excluded.closing_balance,
                opening_source = excluded.opening_source,
                total_deposits = excluded.total_deposits,
                total_withdrawals = excluded.total_withdrawals,
                net_new_capital = excluded.net_new_capital,
                gross_pnl = excluded.gross_pnl,
                carried_loss_in = excluded.carried_loss_in,
                net_pnl = excluded.net_pnl,
                performance_fee = excluded.performance_fee,
                carried_loss_out = excluded.carried_loss_out,
                realized_pnl = excluded.realized_pnl,
                unrealized_pnl_change = excluded.unrealized_pnl_change,
                client_share = excluded.client_share,
                total_trades = excluded.total_trades,
                winning_trades = excluded.winning_trades,
                losing_trades = excluded.losing_trades,
                win_rate = excluded.win_rate,
                profit_factor = excluded.profit_factor,
                best_trade_pnl = excluded.best_trade_pnl,
                worst_trade_pnl = excluded.worst_trade_pnl,
                avg_win = excluded.avg_win,
                avg_loss = excluded.avg_loss,
                computed_at_ms = excluded.computed_at_ms
            "#,
        )
        .bind(snapshot.client_id.as_str())
        .bind(snapshot.period.year)
        .bind(snapshot.period.month)
        .bind(s.opening_balance.to_canonical_string())
        .bind(s.closing_balance.to_canonical_string())
        .bind(s.opening_source.as_str())
        .bind(s.total_deposits.to_canonical_string())
        .bind(s.total_withdrawals.to_canonical_string())
        .bind(s.net_new_capital.to_canonical_string())
        .bind(s.gross_pnl.to_canonical_string())
        .bind(s.carried_loss_in.to_canonical_string())
        .bind(s.net_pnl.to_canonical_string())
        .bind(s.performance_fee.to_canonical_string())
        .bind(s.carried_loss_out.to_canonical_string())
        .bind(s.realized_pnl.to_canonical_string())
        .bind(s.unrealized_pnl_change.to_canonical_string())
        .bind(s.client_share.to_canonical_string())
        .bind(t.total_trades)
        .bind(t.winning_trades)
        .bind(t.losing_trades)
        .bind(t.win_rate)
        // NULL encodes an infinite profit factor; REAL cannot hold it.
        .bind(if t.profit_factor.is_infinite() {
            None
        } else {
            Some(t.profit_factor)
        })
        .bind(t.best_trade_pnl.to_canonical_string())
        .bind(t.worst_trade_pnl.to_canonical_string())
        .bind(t.avg_win.to_canonical_string())
        .bind(t.avg_loss.to_canonical_string())
        .bind(snapshot.computed_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_monthly_snapshot(
        &self,
        client_id: &ClientId,
        period: Period,
    ) -> Result<Option<MonthlySnapshot>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT * FROM monthly_snapshots WHERE client_id = ? AND year = ? AND month = ?",
        )
        .bind(client_id.as_str())
        .bind(period.year)
        .bind(period.month)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| row_to_monthly_snapshot(&r)))
    }

    /// All snapshots for a client, chronological.
    pub async fn list_monthly_snapshots(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<MonthlySnapshot>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM monthly_snapshots WHERE client_id = ? ORDER BY year ASC, month ASC",
        )
        .bind(client_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_monthly_snapshot).collect())
    }

    /// Most recent snapshot strictly before the given period.
    pub async fn latest_snapshot_before(
        &self,
        client_id: &ClientId,
        period: Period,
    ) -> Result<Option<MonthlySnapshot>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT * FROM monthly_snapshots
            WHERE client_id = ? AND (year < ? OR (year = ? AND month < ?))
            ORDER BY year DESC, month DESC
            LIMIT 1
            "#,
        )
        .bind(client_id.as_str())
        .bind(period.year)
        .bind(period.year)
        .bind(period.month)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| row_to_monthly_snapshot(&r)))
    }

    /// Derived carried loss: the latest snapshot's carried_loss_out, 0 with
    /// no history. The client row holds no cached copy that could drift.
    pub async fn current_carried_loss(
        &self,
        client_id: &ClientId,
    ) -> Result<Decimal, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT carried_loss_out FROM monthly_snapshots
            WHERE client_id = ?
            ORDER BY year DESC, month DESC
            LIMIT 1
            "#,
        )
        .bind(client_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row
            .map(|r| decimal_column(&r, "carried_loss_out"))
            .unwrap_or_else(Decimal::zero))
    }

    pub async fn mark_report_sent(
        &self,
        client_id: &ClientId,
        period: Period,
        sent_at: TimeMs,
        recipient: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE monthly_snapshots
            SET report_sent_at_ms = ?, report_recipient = ?
            WHERE client_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(sent_at.as_ms())
        .bind(recipient)
        .bind(client_id.as_str())
        .bind(period.year)
        .bind(period.month)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- fee ledger --------------------------------------------------------

    /// Accumulate a (possibly partial) fee payment onto a period's snapshot.
    ///
    /// Returns None when no snapshot exists for the period.
    pub async fn record_fee_payment(
        &self,
        client_id: &ClientId,
        period: Period,
        amount: Decimal,
        reference: Option<&str>,
        paid_at: TimeMs,
    ) -> Result<Option<FeePaymentReceipt>, sqlx::Error> {
        let snapshot = match self.get_monthly_snapshot(client_id, period).await? {
            Some(s) => s,
            None => return Ok(None),
        };

        let total_paid = snapshot.fee_paid + amount;
        let outstanding = (snapshot.stats.performance_fee - total_paid).max(Decimal::zero());

        sqlx::query(
            r#"
            UPDATE monthly_snapshots
            SET fee_paid = ?, fee_paid_at_ms = ?, fee_payment_ref = ?
            WHERE client_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(total_paid.to_canonical_string())
        .bind(paid_at.as_ms())
        .bind(reference.or(snapshot.fee_payment_ref.as_deref()))
        .bind(client_id.as_str())
        .bind(period.year)
        .bind(period.month)
        .execute(&self.pool)
        .await?;

        Ok(Some(FeePaymentReceipt {
            total_paid,
            outstanding,
            fully_settled: outstanding.is_zero(),
        }))
    }

    /// All-time fee aggregates over fee-bearing periods.
    ///
    /// `client_id` of None aggregates fund-wide.
    pub async fn fee_totals(
        &self,
        client_id: Option<&ClientId>,
    ) -> Result<FeeTotals, sqlx::Error> {
        let rows = if let Some(id) = client_id {
            sqlx::query(
                r#"
                SELECT performance_fee, fee_paid FROM monthly_snapshots
                WHERE client_id = ? AND performance_fee != '0'
                "#,
            )
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT performance_fee, fee_paid FROM monthly_snapshots WHERE performance_fee != '0'",
            )
            .fetch_all(&self.pool)
            .await?
        };

        let mut earned = Decimal::zero();
        let mut paid = Decimal::zero();
        let mut outstanding = Decimal::zero();
        for row in &rows {
            let fee = decimal_column(row, "performance_fee");
            let fee_paid = decimal_column(row, "fee_paid");
            earned = earned + fee;
            paid = paid + fee_paid;
            outstanding = outstanding + (fee - fee_paid).max(Decimal::zero());
        }
        Ok(FeeTotals {
            earned,
            paid,
            outstanding,
        })
    }

    // ---- audit log ---------------------------------------------------------

    pub async fn append_audit(
        &self,
        client_id: &ClientId,
        kind: AuditKind,
        time_ms: TimeMs,
        detail: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO audit_log (client_id, kind, time_ms, detail) VALUES (?, ?, ?, ?)")
            .bind(client_id.as_str())
            .bind(kind.as_str())
            .bind(time_ms.as_ms())
            .bind(detail.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Latest audit entries for a client, newest first.
    pub async fn audit_entries(
        &self,
        client_id: &ClientId,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, kind, time_ms, detail FROM audit_log
            WHERE client_id = ?
            ORDER BY time_ms DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(client_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let kind: String = r.get("kind");
                let detail: String = r.get("detail");
                AuditLogEntry {
                    id: r.get("id"),
                    client_id: ClientId::new(r.get("client_id")),
                    kind: AuditKind::parse(&kind),
                    time_ms: TimeMs::new(r.get("time_ms")),
                    detail: serde_json::from_str(&detail).unwrap_or(serde_json::Value::Null),
                }
            })
            .collect())
    }
}

// ---- row mappers -----------------------------------------------------------

fn decimal_column(row: &SqliteRow, name: &str) -> Decimal {
    let s: String = row.get(name);
    Decimal::from_str(&s).unwrap_or_default()
}

fn opt_decimal_column(row: &SqliteRow, name: &str) -> Option<Decimal> {
    let s: Option<String> = row.get(name);
    s.and_then(|v| Decimal::from_str(&v).ok())
}

fn row_to_client(row: &SqliteRow) -> Client {
    let active: i64 = row.get("active");
    Client {
        id: ClientId::new(row.get("id")),
        name: row.get("name"),
        contact: row.get("contact"),
        trading_account: row.get("trading_account"),
        profit_share: decimal_column(row, "profit_share"),
        initial_capital: decimal_column(row, "initial_capital"),
        active: active != 0,
        created_at: TimeMs::new(row.get("created_at_ms")),
    }
}

fn row_to_balance(row: &SqliteRow) -> BalanceSnapshot {
    BalanceSnapshot {
        client_id: ClientId::new(row.get("client_id")),
        balance: decimal_column(row, "balance"),
        equity: opt_decimal_column(row, "equity"),
        time_ms: TimeMs::new(row.get("time_ms")),
    }
}

fn row_to_capital_event(row: &SqliteRow) -> CapitalEvent {
    let kind: String = row.get("kind");
    CapitalEvent {
        event_key: row.get("event_key"),
        client_id: ClientId::new(row.get("client_id")),
        kind: CapitalKind::parse(&kind).unwrap_or(CapitalKind::Deposit),
        amount: decimal_column(row, "amount"),
        note: row.get("note"),
        occurred_at: TimeMs::new(row.get("occurred_at_ms")),
        recorded_at: TimeMs::new(row.get("recorded_at_ms")),
        recorded_by: row.get("recorded_by"),
        balance_before: opt_decimal_column(row, "balance_before"),
        balance_after: opt_decimal_column(row, "balance_after"),
    }
}

fn row_to_trade(row: &SqliteRow) -> Trade {
    let side: String = row.get("side");
    Trade {
        client_id: ClientId::new(row.get("client_id")),
        side: Side::parse(&side).unwrap_or(Side::Buy),
        price: decimal_column(row, "price"),
        quantity: decimal_column(row, "quantity"),
        notional: decimal_column(row, "notional"),
        pnl: opt_decimal_column(row, "pnl"),
        pnl_pct: row.get("pnl_pct"),
        reason: row.get("reason"),
        time_ms: TimeMs::new(row.get("time_ms")),
    }
}

fn row_to_monthly_snapshot(row: &SqliteRow) -> MonthlySnapshot {
    let opening_source: String = row.get("opening_source");
    let profit_factor: Option<f64> = row.get("profit_factor");
    let total_trades: i64 = row.get("total_trades");
    let winning_trades: i64 = row.get("winning_trades");
    let losing_trades: i64 = row.get("losing_trades");
    let fee_paid_at: Option<i64> = row.get("fee_paid_at_ms");
    let report_sent_at: Option<i64> = row.get("report_sent_at_ms");
    let year: i64 = row.get("year");
    let month: i64 = row.get("month");

    MonthlySnapshot {
        client_id: ClientId::new(row.get("client_id")),
        period: Period::new(year as i32, month as u32).unwrap_or(Period {
            year: year as i32,
            month: 1,
        }),
        stats: MonthStats {
            opening_balance: decimal_column(row, "opening_balance"),
            closing_balance: decimal_column(row, "closing_balance"),
            opening_source: OpeningSource::parse(&opening_source)
                .unwrap_or(OpeningSource::Missing),
            total_deposits: decimal_column(row, "total_deposits"),
            total_withdrawals: decimal_column(row, "total_withdrawals"),
            net_new_capital: decimal_column(row, "net_new_capital"),
            gross_pnl: decimal_column(row, "gross_pnl"),
            carried_loss_in: decimal_column(row, "carried_loss_in"),
            net_pnl: decimal_column(row, "net_pnl"),
            performance_fee: decimal_column(row, "performance_fee"),
            carried_loss_out: decimal_column(row, "carried_loss_out"),
            realized_pnl: decimal_column(row, "realized_pnl"),
            unrealized_pnl_change: decimal_column(row, "unrealized_pnl_change"),
            client_share: decimal_column(row, "client_share"),
            trades: TradeStats {
                total_trades: total_trades as u32,
                winning_trades: winning_trades as u32,
                losing_trades: losing_trades as u32,
                win_rate: row.get("win_rate"),
                profit_factor: profit_factor.unwrap_or(f64::INFINITY),
                best_trade_pnl: decimal_column(row, "best_trade_pnl"),
                worst_trade_pnl: decimal_column(row, "worst_trade_pnl"),
                avg_win: decimal_column(row, "avg_win"),
                avg_loss: decimal_column(row, "avg_loss"),
            },
        },
        fee_paid: decimal_column(row, "fee_paid"),
        fee_paid_at: fee_paid_at.map(TimeMs::new),
        fee_payment_ref: row.get("fee_payment_ref"),
        report_sent_at: report_sent_at.map(TimeMs::new),
        report_recipient: row.get("report_recipient"),
        computed_at: TimeMs::new(row.get("computed_at_ms")),
    }
}
