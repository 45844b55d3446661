//! The persisted unit of fund accounting: one statement per (client, period).

use crate::domain::{ClientId, Decimal, Period, TimeMs};
use serde::{Deserialize, Serialize};

/// Which data source supplied the opening balance.
///
/// The precedence is explicit and recorded so it can be audited: a prior-period
/// snapshot beats the first snapshot inside the period (a sync outage during
/// the first days of a month would otherwise corrupt the opening figure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningSource {
    /// Last balance observed strictly before the period start.
    PriorPeriod,
    /// Earliest balance snapshot inside the period.
    FirstInPeriod,
    /// No balance data at all; opening defaulted to zero.
    Missing,
}

impl OpeningSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpeningSource::PriorPeriod => "prior_period",
            OpeningSource::FirstInPeriod => "first_in_period",
            OpeningSource::Missing => "missing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prior_period" => Some(OpeningSource::PriorPeriod),
            "first_in_period" => Some(OpeningSource::FirstInPeriod),
            "missing" => Some(OpeningSource::Missing),
            _ => None,
        }
    }
}

/// Closed-trade statistics for one period.
///
/// Ratio fields are f64 on purpose: profit factor is defined as infinity
/// when there are wins and zero gross loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    /// Percentage of closed trades that won, 0 when no closed trades.
    pub win_rate: f64,
    /// Gross win sum / gross loss sum; infinity when losses are zero but
    /// wins are not; 0 when there are no wins either.
    pub profit_factor: f64,
    pub best_trade_pnl: Decimal,
    pub worst_trade_pnl: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
}

impl TradeStats {
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            best_trade_pnl: Decimal::zero(),
            worst_trade_pnl: Decimal::zero(),
            avg_win: Decimal::zero(),
            avg_loss: Decimal::zero(),
        }
    }
}

/// Output of the period statistics calculator. Pure derivation, no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub opening_source: OpeningSource,

    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    /// deposits - withdrawals.
    pub net_new_capital: Decimal,

    /// (closing - opening) - net_new_capital: trading-only P&L.
    pub gross_pnl: Decimal,
    /// Unrecovered loss carried in from prior periods (>= 0).
    pub carried_loss_in: Decimal,
    /// gross_pnl - carried_loss_in.
    pub net_pnl: Decimal,
    /// Fee on positive net P&L only (>= 0).
    pub performance_fee: Decimal,
    /// |net_pnl| when net_pnl < 0, else 0.
    pub carried_loss_out: Decimal,

    /// Sum of closed-trade realized P&L.
    pub realized_pnl: Decimal,
    /// gross_pnl - realized_pnl: movement attributable to open positions.
    pub unrealized_pnl_change: Decimal,
    /// What the client keeps: net_pnl - fee when profitable, net_pnl otherwise.
    pub client_share: Decimal,

    pub trades: TradeStats,
}

/// A MonthStats persisted under its (client, year, month) key, plus the
/// mutable fee-settlement and report-delivery state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    pub client_id: ClientId,
    pub period: Period,
    #[serde(flatten)]
    pub stats: MonthStats,

    /// Cumulative fee paid so far (partial payments accumulate).
    pub fee_paid: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_paid_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_payment_ref: Option<String>,

    /// Idempotency marker: once set, the automated pipeline skips this period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_sent_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_recipient: Option<String>,

    pub computed_at: TimeMs,
}

impl MonthlySnapshot {
    /// Wrap freshly computed stats for persistence.
    pub fn computed(client_id: ClientId, period: Period, stats: MonthStats) -> Self {
        Self {
            client_id,
            period,
            stats,
            fee_paid: Decimal::zero(),
            fee_paid_at: None,
            fee_payment_ref: None,
            report_sent_at: None,
            report_recipient: None,
            computed_at: TimeMs::now(),
        }
    }

    /// Fee still owed for this period.
    pub fn fee_outstanding(&self) -> Decimal {
        (self.stats.performance_fee - self.fee_paid).max(Decimal::zero())
    }
}
