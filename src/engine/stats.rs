//! Period statistics calculator.
//!
//! Pure derivation of a complete monthly statement from the period's raw
//! inputs: balance snapshots, capital events, closed trades, the loss
//! carried in from prior periods, and the fee fraction. No storage access;
//! the caller queries adjacent-period data and passes the prior closing
//! balance as an override.

use crate::domain::{
    BalanceSnapshot, CapitalEvent, Decimal, MonthStats, OpeningSource, Trade, TradeStats,
};
use tracing::debug;

/// Compute the full statement for one period.
///
/// Opening balance precedence: `prior_closing_override` (last balance
/// observed strictly before the period start, queried by the caller) beats
/// the earliest snapshot inside the period, which beats zero. The choice is
/// recorded on the result as `opening_source`.
///
/// Gross P&L is capital-adjusted: `(closing - opening) - net_new_capital`,
/// so deposits and withdrawals inside the period do not show up as trading
/// gain or loss. The high-water mark is applied at the gross level: a loss
/// carried in must be fully recovered before any fee accrues.
pub fn compute_stats(
    trades: &[Trade],
    balances: &[BalanceSnapshot],
    capital_events: &[CapitalEvent],
    carried_loss_in: Decimal,
    fee_fraction: Decimal,
    prior_closing_override: Option<Decimal>,
) -> MonthStats {
    let mut sorted: Vec<&BalanceSnapshot> = balances.iter().collect();
    sorted.sort_by_key(|s| s.time_ms);

    let (opening_balance, opening_source) = match (prior_closing_override, sorted.first()) {
        (Some(prior), _) => (prior, OpeningSource::PriorPeriod),
        (None, Some(first)) => (first.balance, OpeningSource::FirstInPeriod),
        (None, None) => (Decimal::zero(), OpeningSource::Missing),
    };
    let closing_balance = sorted.last().map(|s| s.balance).unwrap_or_else(Decimal::zero);

    debug!(
        source = opening_source.as_str(),
        opening = %opening_balance,
        closing = %closing_balance,
        "opening balance source selected"
    );

    let mut total_deposits = Decimal::zero();
    let mut total_withdrawals = Decimal::zero();
    for event in capital_events {
        match event.kind {
            crate::domain::CapitalKind::Deposit => total_deposits = total_deposits + event.amount,
            crate::domain::CapitalKind::Withdrawal => {
                total_withdrawals = total_withdrawals + event.amount
            }
        }
    }
    let net_new_capital = total_deposits - total_withdrawals;

    let gross_pnl = (closing_balance - opening_balance) - net_new_capital;

    let net_pnl = gross_pnl - carried_loss_in;
    let (performance_fee, carried_loss_out) = if net_pnl.is_positive() {
        (net_pnl * fee_fraction, Decimal::zero())
    } else {
        (Decimal::zero(), net_pnl.abs())
    };

    let trade_stats = compute_trade_stats(trades);

    let realized_pnl = trades
        .iter()
        .filter(|t| t.is_closed())
        .filter_map(|t| t.pnl)
        .fold(Decimal::zero(), |acc, pnl| acc + pnl);
    let unrealized_pnl_change = gross_pnl - realized_pnl;
    let client_share = if net_pnl.is_positive() {
        net_pnl - performance_fee
    } else {
        net_pnl
    };

    MonthStats {
        opening_balance,
        closing_balance,
        opening_source,
        total_deposits,
        total_withdrawals,
        net_new_capital,
        gross_pnl,
        carried_loss_in,
        net_pnl,
        performance_fee,
        carried_loss_out,
        realized_pnl,
        unrealized_pnl_change,
        client_share,
        trades: trade_stats,
    }
}

/// Derive win/loss statistics over closed trades only.
fn compute_trade_stats(trades: &[Trade]) -> TradeStats {
    let closed: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.is_closed())
        .filter_map(|t| t.pnl)
        .collect();

    if closed.is_empty() {
        return TradeStats::empty();
    }

    let wins: Vec<Decimal> = closed.iter().copied().filter(|p| p.is_positive()).collect();
    let losses: Vec<Decimal> = closed.iter().copied().filter(|p| p.is_negative()).collect();

    let gross_win: Decimal = wins.iter().fold(Decimal::zero(), |acc, p| acc + *p);
    let gross_loss: Decimal = losses
        .iter()
        .fold(Decimal::zero(), |acc, p| acc + p.abs());

    let win_rate = wins.len() as f64 / closed.len() as f64 * 100.0;
    let profit_factor = if gross_loss.is_zero() {
        if gross_win.is_positive() {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        (gross_win / gross_loss).to_f64_lossy()
    };

    let best = closed
        .iter()
        .copied()
        .fold(closed[0], |acc, p| acc.max(p));
    let worst = closed
        .iter()
        .copied()
        .fold(closed[0], |acc, p| if p < acc { p } else { acc });

    let avg_win = if wins.is_empty() {
        Decimal::zero()
    } else {
        gross_win / Decimal::from_int(wins.len() as i64)
    };
    let avg_loss = if losses.is_empty() {
        Decimal::zero()
    } else {
        -(gross_loss / Decimal::from_int(losses.len() as i64))
    };

    TradeStats {
        total_trades: closed.len() as u32,
        winning_trades: wins.len() as u32,
        losing_trades: losses.len() as u32,
        win_rate,
        profit_factor,
        best_trade_pnl: best,
        worst_trade_pnl: worst,
        avg_win,
        avg_loss,
    }
}
