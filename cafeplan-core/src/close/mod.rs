//! Month-end close checklist: the validation checks and the report that
//! gates closing the books.

mod check;
mod engine;

pub use check::{CheckCategory, ValidationCheck};
pub use engine::{
    DEFAULT_CHECK_TIMEOUT, FinancialSummary, LARGE_TRANSACTION_THRESHOLD_CENTS, MonthEndReport,
    MonthEndValidator, SYNC_FRESHNESS_HOURS, ValidationError,
};
