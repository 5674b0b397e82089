use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{FederalWithholding, FilingStatus, StateWithholding};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A group of invoices sharing (company, invoice date, total) — the
/// signature of an accidental double entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateInvoiceGroup {
    pub company_id: i64,
    pub invoice_date: NaiveDate,
    pub total_cents: i64,
    pub count: i64,
}

/// Half-open `[first day, first day of next month)` bounds for an
/// accounting month. Backends use these instead of string-formatting date
/// filters into SQL.
pub fn month_bounds(
    year: i32,
    month: u32,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, end))
}

/// Read/write access to withholding configuration plus the read-only query
/// shapes the month-end validation engine needs. The engine defines which
/// fields and filters each query uses; the storage engine is the backend's
/// business.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    // Withholding configuration
    async fn get_federal_withholding(
        &self,
        tax_year: i32,
        filing_status: FilingStatus,
    ) -> Result<FederalWithholding, RepositoryError>;

    /// Replaces all brackets for (year, status); returns the inserted count.
    async fn replace_federal_withholding(
        &self,
        table: &FederalWithholding,
    ) -> Result<usize, RepositoryError>;

    async fn get_state_withholding(
        &self,
        state: &str,
    ) -> Result<StateWithholding, RepositoryError>;

    async fn upsert_state_withholding(
        &self,
        config: &StateWithholding,
    ) -> Result<(), RepositoryError>;

    async fn list_states(&self) -> Result<Vec<String>, RepositoryError>;

    // Month-end: critical checks
    async fn reconciliation_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError>;

    /// Timestamp of the most recent QuickBooks sync, if any sync ever ran.
    async fn latest_sync_at(&self) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    /// Invoices in the month with both `emailed_at` and `mailed_at` null.
    async fn unsent_invoice_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError>;

    /// Unmatched positive bank transactions posted in the month.
    async fn unmatched_deposit_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError>;

    // Month-end: important checks
    async fn overdue_invoice_count(&self) -> Result<i64, RepositoryError>;

    /// Bills due strictly before `cutoff` that are not paid. The month-end
    /// engine passes the first day of the next month, covering everything
    /// due through month end.
    async fn unpaid_bill_count_due_before(
        &self,
        cutoff: NaiveDate,
    ) -> Result<i64, RepositoryError>;

    async fn failed_payment_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError>;

    async fn pending_refund_count(&self) -> Result<i64, RepositoryError>;

    // Month-end: recommended checks
    async fn large_payment_count(
        &self,
        year: i32,
        month: u32,
        threshold_cents: i64,
    ) -> Result<i64, RepositoryError>;

    async fn duplicate_invoice_groups(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<DuplicateInvoiceGroup>, RepositoryError>;

    /// All invoice numbers issued in the month, for the sequence audit.
    async fn invoice_numbers(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<String>, RepositoryError>;

    // Month-end: financial summary
    async fn invoice_total_cents(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError>;

    async fn bill_total_cents(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError>;

    /// Total of invoices not yet collected, any month.
    async fn outstanding_receivable_cents(&self) -> Result<i64, RepositoryError>;

    /// Total of bills not yet paid, any month.
    async fn outstanding_payable_cents(&self) -> Result<i64, RepositoryError>;

    /// Current bank balance: sum of all posted bank transactions.
    async fn bank_balance_cents(&self) -> Result<i64, RepositoryError>;
}
