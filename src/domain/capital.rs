//! Capital event ledger record: deposits and withdrawals.

use crate::domain::{ClientId, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// Kind of capital event. Magnitude is always positive; sign is inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CapitalKind {
    Deposit,
    Withdrawal,
}

impl CapitalKind {
    /// Parse from the wire/storage form ("DEPOSIT" / "WITHDRAWAL").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEPOSIT" => Some(CapitalKind::Deposit),
            "WITHDRAWAL" => Some(CapitalKind::Withdrawal),
            _ => None,
        }
    }

    /// Signed multiplier (+1 deposit, -1 withdrawal).
    pub fn sign(&self) -> i32 {
        match self {
            CapitalKind::Deposit => 1,
            CapitalKind::Withdrawal => -1,
        }
    }
}

impl std::fmt::Display for CapitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapitalKind::Deposit => write!(f, "DEPOSIT"),
            CapitalKind::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

/// A recorded deposit or withdrawal. Immutable once written; corrections
/// are new offsetting events, never edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalEvent {
    /// Stable unique identifier for this event.
    ///
    /// Priority: external reference (if supplied) > hash of deterministic fields.
    pub event_key: String,
    pub client_id: ClientId,
    pub kind: CapitalKind,
    /// Magnitude, always > 0.
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the money actually moved (distinct from when it was recorded).
    pub occurred_at: TimeMs,
    pub recorded_at: TimeMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    /// Best-effort balance estimate before/after the event, for audit only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_before: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Decimal>,
}

impl CapitalEvent {
    /// Create a new event and compute its `event_key`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_id: ClientId,
        kind: CapitalKind,
        amount: Decimal,
        note: Option<String>,
        occurred_at: TimeMs,
        recorded_by: Option<String>,
        external_ref: Option<String>,
    ) -> Self {
        let event_key =
            Self::compute_event_key(&client_id, kind, &amount, occurred_at, external_ref.as_deref());
        Self {
            event_key,
            client_id,
            kind,
            amount,
            note,
            occurred_at,
            recorded_at: TimeMs::now(),
            recorded_by,
            balance_before: None,
            balance_after: None,
        }
    }

    /// Compute a stable unique key for this event.
    ///
    /// Priority: external reference (if present) > truncated SHA-256 over the
    /// deterministic fields (client, kind, amount, occurred_at). 128 bits of
    /// hash gives ample collision resistance for any plausible event volume.
    pub fn compute_event_key(
        client_id: &ClientId,
        kind: CapitalKind,
        amount: &Decimal,
        occurred_at: TimeMs,
        external_ref: Option<&str>,
    ) -> String {
        if let Some(r) = external_ref.map(str::trim).filter(|s| !s.is_empty()) {
            return r.to_lowercase();
        }

        use sha2::{Digest, Sha256};

        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hash_var(&mut hasher, client_id.as_str());
        hash_var(&mut hasher, &kind.to_string());
        hash_var(&mut hasher, &amount.to_canonical_string());
        hasher.update(occurred_at.as_ms().to_le_bytes());

        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }

    /// The amount with its sign applied (deposits positive, withdrawals negative).
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            CapitalKind::Deposit => self.amount,
            CapitalKind::Withdrawal => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn event(kind: CapitalKind, amount: &str, external_ref: Option<&str>) -> CapitalEvent {
        CapitalEvent::new(
            ClientId::new("c1".into()),
            kind,
            Decimal::from_str(amount).unwrap(),
            None,
            TimeMs::new(1000),
            Some("admin".into()),
            external_ref.map(|s| s.to_string()),
        )
    }

    #[test]
    fn event_key_prefers_external_ref() {
        let e = event(CapitalKind::Deposit, "500", Some("WIRE-2026-001"));
        assert_eq!(e.event_key, "wire-2026-001");
    }

    #[test]
    fn event_key_hash_is_amount_normalized() {
        let a = event(CapitalKind::Deposit, "500.00", None);
        let b = event(CapitalKind::Deposit, "500", None);
        assert_eq!(a.event_key, b.event_key);
        assert!(a.event_key.starts_with("hash:"));
    }

    #[test]
    fn event_key_distinguishes_kind() {
        let dep = event(CapitalKind::Deposit, "500", None);
        let wd = event(CapitalKind::Withdrawal, "500", None);
        assert_ne!(dep.event_key, wd.event_key);
    }

    #[test]
    fn signed_amount_applies_sign() {
        assert_eq!(
            event(CapitalKind::Deposit, "300", None).signed_amount(),
            Decimal::from_int(300)
        );
        assert_eq!(
            event(CapitalKind::Withdrawal, "300", None).signed_amount(),
            Decimal::from_int(-300)
        );
    }

    #[test]
    fn kind_parse_round_trips() {
        assert_eq!(CapitalKind::parse("DEPOSIT"), Some(CapitalKind::Deposit));
        assert_eq!(
            CapitalKind::parse("WITHDRAWAL"),
            Some(CapitalKind::Withdrawal)
        );
        assert_eq!(CapitalKind::parse("deposit"), None);
    }
}
