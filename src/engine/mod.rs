//! Accounting engine: period statistics calculator and reconciliation checks.

pub mod reconcile;
pub mod stats;

pub use reconcile::{check_continuity, check_identity, Finding, FindingKind, LikelyCause};
pub use stats::compute_stats;
