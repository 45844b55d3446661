//! Fund participant record.

use crate::domain::{ClientId, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// A fund participant.
///
/// There is deliberately no mutable carried-loss field here: the current
/// carried loss is a derived read, the `carried_loss_out` of the client's
/// latest persisted monthly snapshot. That keeps the append-only snapshot
/// history the single source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    /// Display name.
    pub name: String,
    /// Contact address reports are delivered to.
    pub contact: String,
    /// Linked live-trading account identifier, when one exists.
    pub trading_account: Option<String>,
    /// Operator's share of net profit, e.g. 0.5.
    pub profit_share: Decimal,
    /// Informational starting capital.
    pub initial_capital: Decimal,
    /// Soft-deactivation flag; inactive clients are skipped by the close run.
    pub active: bool,
    pub created_at: TimeMs,
}

impl Client {
    /// Create a new active client with a generated identifier.
    pub fn new(
        name: String,
        contact: String,
        trading_account: Option<String>,
        profit_share: Decimal,
        initial_capital: Decimal,
    ) -> Self {
        Self {
            id: ClientId::generate(),
            name,
            contact,
            trading_account,
            profit_share,
            initial_capital,
            active: true,
            created_at: TimeMs::now(),
        }
    }
}
