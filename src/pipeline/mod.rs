//! Month-close orchestration: per-client computation, persistence, and
//! report delivery.

pub mod close;
pub mod render;

pub use close::{ClientCloseOutcome, ClientCloseReport, CloseError, MonthCloser};
pub use render::{render_statement, statement_subject};
