//! Closed-trade record consumed by the statistics calculator.

use crate::domain::{ClientId, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// Trade side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl Side {
    /// Parse from the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// One executed order.
///
/// By this system's convention only SELL-side executions with a non-null
/// realized P&L count as closed trades for statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub client_id: ClientId,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub notional: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub time_ms: TimeMs,
}

impl Trade {
    /// True when this execution closes a position for statistics purposes.
    pub fn is_closed(&self) -> bool {
        self.side == Side::Sell && self.pnl.is_some()
    }
}
