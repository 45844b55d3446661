//! Append-only audit trail entry.

use crate::domain::{ClientId, TimeMs};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category of audited action.
///
/// Stored as a plain string. Labels this build does not recognize (written
/// by a newer or older build) round-trip through `Unknown` verbatim; the
/// trail never relabels what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditKind {
    BalanceSnapshot,
    CapitalEvent,
    FeePayment,
    ReportSent,
    MonthClosed,
    Unknown(String),
}

impl AuditKind {
    pub fn as_str(&self) -> &str {
        match self {
            AuditKind::BalanceSnapshot => "balance_snapshot",
            AuditKind::CapitalEvent => "capital_event",
            AuditKind::FeePayment => "fee_payment",
            AuditKind::ReportSent => "report_sent",
            AuditKind::MonthClosed => "month_closed",
            AuditKind::Unknown(raw) => raw,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "balance_snapshot" => AuditKind::BalanceSnapshot,
            "capital_event" => AuditKind::CapitalEvent,
            "fee_payment" => AuditKind::FeePayment,
            "report_sent" => AuditKind::ReportSent,
            "month_closed" => AuditKind::MonthClosed,
            other => AuditKind::Unknown(other.to_string()),
        }
    }
}

impl Serialize for AuditKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AuditKind::parse(&s))
    }
}

/// One immutable record of a state-changing action. Never updated or
/// deleted; the system of record for what happened and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    pub client_id: ClientId,
    pub kind: AuditKind,
    pub time_ms: TimeMs,
    /// Free-form structured payload (signed amounts, before/after, refs).
    pub detail: serde_json::Value,
}
