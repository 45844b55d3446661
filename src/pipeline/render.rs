//! Plain-text monthly statement rendering.
//!
//! Produces the document handed to the notification sink. Presentation
//! only; every figure comes straight from the persisted snapshot.

use crate::domain::{Client, MonthlySnapshot, Period};

/// Subject line for a period statement.
pub fn statement_subject(period: Period) -> String {
    format!("Monthly statement {}", period.label())
}

/// Render a snapshot into the delivery document.
pub fn render_statement(client: &Client, snapshot: &MonthlySnapshot) -> String {
    let s = &snapshot.stats;
    let t = &s.trades;

    let profit_factor = if t.profit_factor.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", t.profit_factor)
    };

    let mut doc = String::new();
    doc.push_str(&format!(
        "Statement for {} - {}\n\n",
        client.name,
        snapshot.period.label()
    ));
    doc.push_str(&format!("Opening balance:   {}\n", s.opening_balance));
    doc.push_str(&format!("Closing balance:   {}\n", s.closing_balance));
    doc.push_str(&format!(
        "Deposits: {}   Withdrawals: {}   Net new capital: {}\n\n",
        s.total_deposits, s.total_withdrawals, s.net_new_capital
    ));
    doc.push_str(&format!("Gross P&L (capital-adjusted): {}\n", s.gross_pnl));
    if s.carried_loss_in.is_positive() {
        doc.push_str(&format!("Loss carried in:              {}\n", s.carried_loss_in));
    }
    doc.push_str(&format!("Net P&L:                      {}\n", s.net_pnl));
    doc.push_str(&format!("Performance fee:              {}\n", s.performance_fee));
    if s.carried_loss_out.is_positive() {
        doc.push_str(&format!("Loss carried forward:         {}\n", s.carried_loss_out));
    }
    doc.push_str(&format!("Your share:                   {}\n\n", s.client_share));
    doc.push_str(&format!(
        "Trades: {} closed ({} wins / {} losses), win rate {:.1}%, profit factor {}\n",
        t.total_trades, t.winning_trades, t.losing_trades, t.win_rate, profit_factor
    ));
    doc.push_str(&format!(
        "Best: {}   Worst: {}   Avg win: {}   Avg loss: {}\n",
        t.best_trade_pnl, t.worst_trade_pnl, t.avg_win, t.avg_loss
    ));
    doc
}
