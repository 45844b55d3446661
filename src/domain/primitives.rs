//! Domain primitives: TimeMs, ClientId, Period.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Stable client identifier (UUID string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    /// Wrap an existing identifier.
    pub fn new(id: String) -> Self {
        ClientId(id)
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        ClientId(uuid::Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar accounting period: one (year, month) in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Create a period, rejecting out-of-range months.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Period { year, month })
        } else {
            None
        }
    }

    /// The period containing the given instant.
    pub fn containing(at: TimeMs) -> Self {
        let dt = Utc
            .timestamp_millis_opt(at.as_ms())
            .single()
            .unwrap_or_else(Utc::now);
        Period {
            year: dt.year(),
            month: dt.month(),
        }
    }

    /// The immediately preceding calendar month.
    pub fn prev(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The immediately following calendar month.
    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// True when `self` is exactly one calendar month after `earlier`.
    pub fn follows(&self, earlier: &Period) -> bool {
        *self == earlier.next()
    }

    /// First instant of the period (inclusive).
    pub fn start_ms(&self) -> TimeMs {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month is validated to 1..=12, day 1 always exists");
        let dt = date.and_hms_opt(0, 0, 0).expect("midnight always exists");
        TimeMs(Utc.from_utc_datetime(&dt).timestamp_millis())
    }

    /// First instant of the following period (exclusive end of this one).
    pub fn end_ms(&self) -> TimeMs {
        self.next().start_ms()
    }

    /// True when the instant falls inside this period.
    pub fn contains(&self, at: TimeMs) -> bool {
        at >= self.start_ms() && at < self.end_ms()
    }

    /// Human-readable label, e.g. "2026-08".
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
