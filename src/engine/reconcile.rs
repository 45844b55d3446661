//! Reconciliation checks over computed statements and snapshot history.
//!
//! Both checks are advisory: findings are logged and surfaced, never used
//! to block persistence. A client's report is produced even when a check
//! fails; a human investigates before treating the fee figure as final.

use crate::domain::{ClientId, Decimal, MonthStats, MonthlySnapshot, Period};
use serde::Serialize;
use std::str::FromStr;
use tracing::warn;

/// Which check produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// closing != opening + net_new_capital + gross_pnl within tolerance.
    IdentityMismatch,
    /// This month's opening diverges from last month's closing.
    ContinuityBreak,
}

/// Heuristic classification of a continuity break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikelyCause {
    /// Large gap: a deposit or withdrawal was probably never recorded.
    MissingCapitalEvent,
    /// Small gap: a balance snapshot was probably duplicated or missed.
    SnapshotAnomaly,
}

/// One reconciliation finding, tagged to a client and period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub client_id: ClientId,
    pub period: Period,
    pub kind: FindingKind,
    pub expected: Decimal,
    pub actual: Decimal,
    pub delta: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely_cause: Option<LikelyCause>,
}

/// Mismatch tolerance for a given reference balance.
///
/// Relative with an absolute floor: one cent, or one millionth of the
/// reference for large accounts where fixed cents would be too strict a
/// comparison against rounded upstream figures.
pub fn tolerance_for(reference: Decimal) -> Decimal {
    let cent = Decimal::from_str("0.01").expect("constant parses");
    let ppm = Decimal::from_str("0.000001").expect("constant parses");
    cent.max(reference.abs() * ppm)
}

/// Intra-period identity check: `closing == opening + net_new_capital + gross_pnl`.
///
/// Holds exactly by construction when all three figures come from the same
/// calculator run; a real mismatch means the caller mixed balance sources.
pub fn check_identity(client_id: &ClientId, period: Period, stats: &MonthStats) -> Option<Finding> {
    let expected = stats.opening_balance + stats.net_new_capital + stats.gross_pnl;
    let actual = stats.closing_balance;
    let delta = (expected - actual).abs();

    if delta <= tolerance_for(actual) {
        return None;
    }

    let finding = Finding {
        client_id: client_id.clone(),
        period,
        kind: FindingKind::IdentityMismatch,
        expected,
        actual,
        delta,
        likely_cause: None,
    };
    warn!(
        client = %finding.client_id,
        period = %finding.period,
        expected = %expected,
        actual = %actual,
        delta = %delta,
        "accounting identity mismatch"
    );
    Some(finding)
}

/// Cross-period continuity check over a client's persisted snapshots.
///
/// Only pairs exactly one calendar month apart are compared; a skipped
/// month breaks the chain and is not a finding. Input need not be sorted.
pub fn check_continuity(snapshots: &[MonthlySnapshot]) -> Vec<Finding> {
    let mut ordered: Vec<&MonthlySnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.period);

    let mut findings = Vec::new();
    for pair in ordered.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if !curr.period.follows(&prev.period) {
            continue;
        }

        let expected = prev.stats.closing_balance;
        let actual = curr.stats.opening_balance;
        let delta = (expected - actual).abs();
        if delta <= tolerance_for(expected) {
            continue;
        }

        let likely_cause = Some(classify_gap(delta, expected));
        warn!(
            client = %curr.client_id,
            period = %curr.period,
            prior_closing = %expected,
            opening = %actual,
            delta = %delta,
            cause = ?likely_cause,
            "continuity break between adjacent periods"
        );
        findings.push(Finding {
            client_id: curr.client_id.clone(),
            period: curr.period,
            kind: FindingKind::ContinuityBreak,
            expected,
            actual,
            delta,
            likely_cause,
        });
    }
    findings
}

/// A gap above 1% of the prior closing balance looks like an unrecorded
/// capital movement; anything smaller looks like snapshot noise.
fn classify_gap(delta: Decimal, prior_closing: Decimal) -> LikelyCause {
    let one_percent = prior_closing.abs() * Decimal::from_str("0.01").expect("constant parses");
    if delta > one_percent {
        LikelyCause::MissingCapitalEvent
    } else {
        LikelyCause::SnapshotAnomaly
    }
}
