//! Point-in-time account balance observation.

use crate::domain::{ClientId, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// An observed account value at a point in time. Append-only.
///
/// `equity` may differ from `balance` when the live feed reports total
/// equity including unrealized P&L; it is kept for display, never used
/// by the period calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub client_id: ClientId,
    pub balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity: Option<Decimal>,
    pub time_ms: TimeMs,
}

impl BalanceSnapshot {
    pub fn new(
        client_id: ClientId,
        balance: Decimal,
        equity: Option<Decimal>,
        time_ms: TimeMs,
    ) -> Self {
        Self {
            client_id,
            balance,
            equity,
            time_ms,
        }
    }
}
