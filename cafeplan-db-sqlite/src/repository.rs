use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cafeplan_core::db::repository::{DuplicateInvoiceGroup, month_bounds};
use cafeplan_core::{
    FederalBracket, FederalWithholding, FilingStatus, LedgerRepository, RepositoryError,
    StateBracket, StateMethod, StateWithholding,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, sqlite::SqlitePool};
use tracing::{debug, info};

use crate::decimal::{decimal_to_f64, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        debug!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            info!(seed = %path.display(), "executing seed file");
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn period_bounds(
    year: i32,
    month: u32,
) -> Result<(NaiveDate, NaiveDate), RepositoryError> {
    month_bounds(year, month).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid accounting period {}-{:02}", year, month))
    })
}

async fn count_where<'q>(
    pool: &SqlitePool,
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
) -> Result<i64, RepositoryError> {
    let row = query
        .fetch_one(pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

    row.try_get("n")
        .map_err(|e| RepositoryError::Database(e.to_string()))
}

#[async_trait]
impl LedgerRepository for SqliteRepository {
    /// An empty bracket table is a valid answer here: the federal calculator
    /// falls back to its flat rate for years that have not been loaded yet.
    async fn get_federal_withholding(
        &self,
        tax_year: i32,
        filing_status: FilingStatus,
    ) -> Result<FederalWithholding, RepositoryError> {
        let rows = sqlx::query(
            "SELECT bracket_over, base_tax, rate
             FROM federal_brackets
             WHERE tax_year = ? AND filing_status = ?
             ORDER BY bracket_over",
        )
        .bind(tax_year)
        .bind(filing_status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut brackets = Vec::new();
        for row in rows {
            brackets.push(FederalBracket {
                over: get_decimal(&row, "bracket_over")?,
                base_tax: get_decimal(&row, "base_tax")?,
                rate: get_decimal(&row, "rate")?,
            });
        }

        Ok(FederalWithholding::new(tax_year, filing_status, brackets))
    }

    async fn replace_federal_withholding(
        &self,
        table: &FederalWithholding,
    ) -> Result<usize, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM federal_brackets WHERE tax_year = ? AND filing_status = ?")
            .bind(table.tax_year)
            .bind(table.filing_status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for bracket in table.brackets() {
            sqlx::query(
                "INSERT INTO federal_brackets (tax_year, filing_status, bracket_over, base_tax, rate)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(table.tax_year)
            .bind(table.filing_status.as_str())
            .bind(decimal_to_f64(bracket.over))
            .bind(decimal_to_f64(bracket.base_tax))
            .bind(decimal_to_f64(bracket.rate))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(table.brackets().len())
    }

    async fn get_state_withholding(
        &self,
        state: &str,
    ) -> Result<StateWithholding, RepositoryError> {
        let row = sqlx::query(
            "SELECT state, method, flat_rate, standard_deduction, personal_exemption,
                    dependent_exemption
             FROM state_withholding WHERE state = ?",
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        let method_name: String = row
            .try_get("method")
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let method = match method_name.as_str() {
            "none" => StateMethod::None,
            "flat" => {
                let rate = get_optional_decimal(&row, "flat_rate")?.ok_or_else(|| {
                    RepositoryError::Database(format!(
                        "State '{}' uses the flat method but has no flat_rate",
                        state
                    ))
                })?;
                StateMethod::Flat { rate }
            }
            "brackets" => {
                let bracket_rows = sqlx::query(
                    "SELECT bracket_over, rate FROM state_brackets
                     WHERE state = ? ORDER BY bracket_over",
                )
                .bind(state)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

                let mut brackets = Vec::new();
                for bracket_row in bracket_rows {
                    brackets.push(StateBracket {
                        over: get_decimal(&bracket_row, "bracket_over")?,
                        rate: get_decimal(&bracket_row, "rate")?,
                    });
                }
                StateMethod::Brackets { brackets }
            }
            other => {
                return Err(RepositoryError::Database(format!(
                    "Invalid withholding method '{}' for state '{}'",
                    other, state
                )));
            }
        };

        StateWithholding::new(
            state,
            method,
            get_decimal(&row, "standard_deduction")?,
            get_decimal(&row, "personal_exemption")?,
            get_decimal(&row, "dependent_exemption")?,
        )
        .map_err(|e| RepositoryError::Database(e.to_string()))
    }

    async fn upsert_state_withholding(
        &self,
        config: &StateWithholding,
    ) -> Result<(), RepositoryError> {
        let (method_name, flat_rate) = match config.method() {
            StateMethod::None => ("none", None),
            StateMethod::Flat { rate } => ("flat", Some(decimal_to_f64(*rate))),
            StateMethod::Brackets { .. } => ("brackets", None),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO state_withholding (state, method, flat_rate, standard_deduction,
                                            personal_exemption, dependent_exemption)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (state) DO UPDATE SET
                method = excluded.method,
                flat_rate = excluded.flat_rate,
                standard_deduction = excluded.standard_deduction,
                personal_exemption = excluded.personal_exemption,
                dependent_exemption = excluded.dependent_exemption",
        )
        .bind(&config.state)
        .bind(method_name)
        .bind(flat_rate)
        .bind(decimal_to_f64(config.standard_deduction))
        .bind(decimal_to_f64(config.personal_exemption))
        .bind(decimal_to_f64(config.dependent_exemption))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM state_brackets WHERE state = ?")
            .bind(&config.state)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if let StateMethod::Brackets { brackets } = config.method() {
            for bracket in brackets {
                sqlx::query(
                    "INSERT INTO state_brackets (state, bracket_over, rate) VALUES (?, ?, ?)",
                )
                .bind(&config.state)
                .bind(decimal_to_f64(bracket.over))
                .bind(decimal_to_f64(bracket.rate))
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_states(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT state FROM state_withholding ORDER BY state")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("state")
                    .map_err(|e| RepositoryError::Database(e.to_string()))
            })
            .collect()
    }

    async fn reconciliation_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM bank_reconciliations WHERE year = ? AND month = ?",
            )
            .bind(year)
            .bind(month),
        )
        .await
    }

    async fn latest_sync_at(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let row = sqlx::query(
            "SELECT synced_at FROM quickbooks_sync_log
             WHERE status = 'success'
             ORDER BY synced_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(|row| {
            row.try_get::<DateTime<Utc>, _>("synced_at")
                .map_err(|e| RepositoryError::Database(e.to_string()))
        })
        .transpose()
    }

    async fn unsent_invoice_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM invoices
                 WHERE invoice_date >= ? AND invoice_date < ?
                   AND emailed_at IS NULL AND mailed_at IS NULL",
            )
            .bind(start)
            .bind(end),
        )
        .await
    }

    async fn unmatched_deposit_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM bank_transactions
                 WHERE posted_on >= ? AND posted_on < ?
                   AND amount_cents > 0 AND matched = 0",
            )
            .bind(start)
            .bind(end),
        )
        .await
    }

    async fn overdue_invoice_count(&self) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM invoices
                 WHERE payment_status = 'open'
                   AND due_date IS NOT NULL AND due_date < ?",
            )
            .bind(Utc::now().date_naive()),
        )
        .await
    }

    async fn unpaid_bill_count_due_before(
        &self,
        cutoff: NaiveDate,
    ) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM bills
                 WHERE payment_status = 'open' AND due_date < ?",
            )
            .bind(cutoff),
        )
        .await
    }

    async fn failed_payment_count(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM payment_transactions
                 WHERE occurred_on >= ? AND occurred_on < ? AND status = 'failed'",
            )
            .bind(start)
            .bind(end),
        )
        .await
    }

    async fn pending_refund_count(&self) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM payment_transactions
                 WHERE kind = 'refund' AND status = 'pending'",
            ),
        )
        .await
    }

    async fn large_payment_count(
        &self,
        year: i32,
        month: u32,
        threshold_cents: i64,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COUNT(*) AS n FROM payment_transactions
                 WHERE occurred_on >= ? AND occurred_on < ?
                   AND ABS(amount_cents) > ?",
            )
            .bind(start)
            .bind(end)
            .bind(threshold_cents),
        )
        .await
    }

    async fn duplicate_invoice_groups(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<DuplicateInvoiceGroup>, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        let rows = sqlx::query(
            "SELECT company_id, invoice_date, total_cents, COUNT(*) AS n
             FROM invoices
             WHERE invoice_date >= ? AND invoice_date < ?
             GROUP BY company_id, invoice_date, total_cents
             HAVING COUNT(*) > 1
             ORDER BY company_id, invoice_date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(DuplicateInvoiceGroup {
                company_id: row
                    .try_get("company_id")
                    .map_err(|e| RepositoryError::Database(e.to_string()))?,
                invoice_date: row
                    .try_get("invoice_date")
                    .map_err(|e| RepositoryError::Database(e.to_string()))?,
                total_cents: row
                    .try_get("total_cents")
                    .map_err(|e| RepositoryError::Database(e.to_string()))?,
                count: row
                    .try_get("n")
                    .map_err(|e| RepositoryError::Database(e.to_string()))?,
            });
        }
        Ok(groups)
    }

    async fn invoice_numbers(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<String>, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        let rows = sqlx::query(
            "SELECT invoice_number FROM invoices
             WHERE invoice_date >= ? AND invoice_date < ?
             ORDER BY invoice_number",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("invoice_number")
                    .map_err(|e| RepositoryError::Database(e.to_string()))
            })
            .collect()
    }

    async fn invoice_total_cents(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COALESCE(SUM(total_cents), 0) AS n FROM invoices
                 WHERE invoice_date >= ? AND invoice_date < ?
                   AND payment_status != 'void'",
            )
            .bind(start)
            .bind(end),
        )
        .await
    }

    async fn bill_total_cents(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, RepositoryError> {
        let (start, end) = period_bounds(year, month)?;

        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COALESCE(SUM(total_cents), 0) AS n FROM bills
                 WHERE bill_date >= ? AND bill_date < ?
                   AND payment_status != 'void'",
            )
            .bind(start)
            .bind(end),
        )
        .await
    }

    async fn outstanding_receivable_cents(&self) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COALESCE(SUM(total_cents), 0) AS n FROM invoices
                 WHERE payment_status = 'open'",
            ),
        )
        .await
    }

    async fn outstanding_payable_cents(&self) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query(
                "SELECT COALESCE(SUM(total_cents), 0) AS n FROM bills
                 WHERE payment_status = 'open'",
            ),
        )
        .await
    }

    async fn bank_balance_cents(&self) -> Result<i64, RepositoryError> {
        count_where(
            &self.pool,
            sqlx::query("SELECT COALESCE(SUM(amount_cents), 0) AS n FROM bank_transactions"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let repo = SqliteRepository::new_with_pool(pool).await;
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    async fn insert_invoice(
        repo: &SqliteRepository,
        company_id: i64,
        number: &str,
        date: &str,
        total_cents: i64,
        status: &str,
        sent: bool,
    ) {
        let emailed_at = sent.then_some("2025-07-28 09:00:00");
        sqlx::query(
            "INSERT INTO invoices (company_id, invoice_number, invoice_date, due_date,
                                   total_cents, payment_status, emailed_at)
             VALUES (?, ?, ?, date(?, '+30 days'), ?, ?, ?)",
        )
        .bind(company_id)
        .bind(number)
        .bind(date)
        .bind(date)
        .bind(total_cents)
        .bind(status)
        .bind(emailed_at)
        .execute(repo.pool())
        .await
        .expect("Failed to insert invoice");
    }

    async fn insert_bill(
        repo: &SqliteRepository,
        vendor: &str,
        bill_date: &str,
        due_date: &str,
        total_cents: i64,
        status: &str,
    ) {
        sqlx::query(
            "INSERT INTO bills (vendor, bill_date, due_date, total_cents, payment_status)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(vendor)
        .bind(bill_date)
        .bind(due_date)
        .bind(total_cents)
        .bind(status)
        .execute(repo.pool())
        .await
        .expect("Failed to insert bill");
    }

    async fn insert_bank_transaction(
        repo: &SqliteRepository,
        posted_on: &str,
        amount_cents: i64,
        matched: bool,
    ) {
        sqlx::query(
            "INSERT INTO bank_transactions (posted_on, amount_cents, matched) VALUES (?, ?, ?)",
        )
        .bind(posted_on)
        .bind(amount_cents)
        .bind(matched)
        .execute(repo.pool())
        .await
        .expect("Failed to insert bank transaction");
    }

    async fn insert_payment(
        repo: &SqliteRepository,
        occurred_on: &str,
        amount_cents: i64,
        kind: &str,
        status: &str,
    ) {
        sqlx::query(
            "INSERT INTO payment_transactions (occurred_on, amount_cents, kind, status)
             VALUES (?, ?, ?, ?)",
        )
        .bind(occurred_on)
        .bind(amount_cents)
        .bind(kind)
        .bind(status)
        .execute(repo.pool())
        .await
        .expect("Failed to insert payment");
    }

    fn sample_federal_table() -> FederalWithholding {
        FederalWithholding::new(
            2024,
            FilingStatus::Single,
            vec![
                FederalBracket {
                    over: dec!(11600),
                    base_tax: dec!(1160),
                    rate: dec!(0.12),
                },
                FederalBracket {
                    over: dec!(0),
                    base_tax: dec!(0),
                    rate: dec!(0.10),
                },
                FederalBracket {
                    over: dec!(47150),
                    base_tax: dec!(5426),
                    rate: dec!(0.22),
                },
            ],
        )
    }

    #[tokio::test]
    async fn federal_withholding_round_trips() {
        let repo = setup_test_db().await;
        let table = sample_federal_table();

        let inserted = repo
            .replace_federal_withholding(&table)
            .await
            .expect("Should insert brackets");
        assert_eq!(inserted, 3);

        let loaded = repo
            .get_federal_withholding(2024, FilingStatus::Single)
            .await
            .expect("Should load brackets");

        assert_eq!(loaded, table);
        let overs: Vec<_> = loaded.brackets().iter().map(|b| b.over).collect();
        assert_eq!(overs, vec![dec!(0), dec!(11600), dec!(47150)]);
    }

    #[tokio::test]
    async fn replace_discards_previous_brackets() {
        let repo = setup_test_db().await;
        repo.replace_federal_withholding(&sample_federal_table())
            .await
            .expect("Should insert brackets");

        let smaller = FederalWithholding::new(
            2024,
            FilingStatus::Single,
            vec![FederalBracket {
                over: dec!(0),
                base_tax: dec!(0),
                rate: dec!(0.11),
            }],
        );
        repo.replace_federal_withholding(&smaller)
            .await
            .expect("Should replace brackets");

        let loaded = repo
            .get_federal_withholding(2024, FilingStatus::Single)
            .await
            .expect("Should load brackets");
        assert_eq!(loaded.brackets().len(), 1);
        assert_eq!(loaded.brackets()[0].rate, dec!(0.11));
    }

    #[tokio::test]
    async fn missing_federal_year_is_an_empty_table() {
        let repo = setup_test_db().await;

        let loaded = repo
            .get_federal_withholding(1999, FilingStatus::Married)
            .await
            .expect("Should load empty table");

        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn flat_state_round_trips() {
        let repo = setup_test_db().await;
        let config = StateWithholding::new(
            "PA",
            StateMethod::Flat { rate: dec!(0.0307) },
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .expect("valid config");

        repo.upsert_state_withholding(&config)
            .await
            .expect("Should upsert state");

        let loaded = repo
            .get_state_withholding("PA")
            .await
            .expect("Should load state");
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn bracket_state_round_trips_and_upsert_replaces_rows() {
        let repo = setup_test_db().await;
        let config = StateWithholding::new(
            "MO",
            StateMethod::Brackets {
                brackets: vec![
                    StateBracket {
                        over: dec!(1273),
                        rate: dec!(0.02),
                    },
                    StateBracket {
                        over: dec!(0),
                        rate: dec!(0.015),
                    },
                ],
            },
            dec!(14600),
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .expect("valid config");

        repo.upsert_state_withholding(&config)
            .await
            .expect("Should upsert state");

        let replacement = StateWithholding::new(
            "MO",
            StateMethod::Brackets {
                brackets: vec![StateBracket {
                    over: dec!(0),
                    rate: dec!(0.02),
                }],
            },
            dec!(14600),
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .expect("valid config");

        repo.upsert_state_withholding(&replacement)
            .await
            .expect("Should upsert again");

        let loaded = repo
            .get_state_withholding("MO")
            .await
            .expect("Should load state");
        assert_eq!(loaded, replacement);
    }

    #[tokio::test]
    async fn no_tax_state_round_trips() {
        let repo = setup_test_db().await;
        let config = StateWithholding::no_tax("TX");

        repo.upsert_state_withholding(&config)
            .await
            .expect("Should upsert state");

        let loaded = repo
            .get_state_withholding("TX")
            .await
            .expect("Should load state");
        assert_eq!(loaded.method(), &StateMethod::None);
    }

    #[tokio::test]
    async fn unknown_state_is_not_found() {
        let repo = setup_test_db().await;

        let result = repo.get_state_withholding("ZZ").await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn list_states_is_sorted() {
        let repo = setup_test_db().await;
        for state in ["TX", "CA", "PA"] {
            repo.upsert_state_withholding(&StateWithholding::no_tax(state))
                .await
                .expect("Should upsert state");
        }

        let states = repo.list_states().await.expect("Should list states");

        assert_eq!(states, vec!["CA", "PA", "TX"]);
    }

    #[tokio::test]
    async fn reconciliation_count_is_scoped_to_the_period() {
        let repo = setup_test_db().await;
        sqlx::query(
            "INSERT INTO bank_reconciliations (year, month, reconciled_at) VALUES
             (2025, 7, '2025-08-02 10:00:00'),
             (2025, 6, '2025-07-01 10:00:00')",
        )
        .execute(repo.pool())
        .await
        .expect("Failed to insert reconciliations");

        assert_eq!(repo.reconciliation_count(2025, 7).await, Ok(1));
        assert_eq!(repo.reconciliation_count(2025, 5).await, Ok(0));
    }

    #[tokio::test]
    async fn latest_sync_skips_failed_runs() {
        let repo = setup_test_db().await;

        assert_eq!(repo.latest_sync_at().await, Ok(None));

        let older = Utc.with_ymd_and_hms(2025, 7, 30, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2025, 7, 31, 8, 0, 0).unwrap();
        let failed = Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).unwrap();
        for (at, status) in [(older, "success"), (newer, "success"), (failed, "error")] {
            sqlx::query("INSERT INTO quickbooks_sync_log (synced_at, status) VALUES (?, ?)")
                .bind(at)
                .bind(status)
                .execute(repo.pool())
                .await
                .expect("Failed to insert sync row");
        }

        assert_eq!(repo.latest_sync_at().await, Ok(Some(newer)));
    }

    #[tokio::test]
    async fn unsent_invoices_respect_month_bounds() {
        let repo = setup_test_db().await;
        insert_invoice(&repo, 1, "INV-202507-0001", "2025-07-03", 50_000, "open", false).await;
        insert_invoice(&repo, 1, "INV-202507-0002", "2025-07-15", 60_000, "open", true).await;
        // Previous month, also unsent.
        insert_invoice(&repo, 1, "INV-202506-0001", "2025-06-30", 40_000, "open", false).await;

        assert_eq!(repo.unsent_invoice_count(2025, 7).await, Ok(1));
        assert_eq!(repo.unsent_invoice_count(2025, 6).await, Ok(1));
    }

    #[tokio::test]
    async fn unmatched_deposits_ignore_withdrawals_and_matched_rows() {
        let repo = setup_test_db().await;
        insert_bank_transaction(&repo, "2025-07-10", 25_000, false).await;
        insert_bank_transaction(&repo, "2025-07-11", 30_000, true).await;
        insert_bank_transaction(&repo, "2025-07-12", -15_000, false).await;
        insert_bank_transaction(&repo, "2025-08-01", 10_000, false).await;

        assert_eq!(repo.unmatched_deposit_count(2025, 7).await, Ok(1));
    }

    #[tokio::test]
    async fn overdue_counts_only_open_past_due_invoices() {
        let repo = setup_test_db().await;
        // Due dates are invoice_date + 30 days, so these are long past due.
        insert_invoice(&repo, 1, "INV-202401-0001", "2024-01-05", 50_000, "open", true).await;
        insert_invoice(&repo, 1, "INV-202401-0002", "2024-01-06", 50_000, "paid", true).await;
        // Far future, never overdue.
        insert_invoice(&repo, 1, "INV-209901-0001", "2099-01-05", 50_000, "open", true).await;

        assert_eq!(repo.overdue_invoice_count().await, Ok(1));
    }

    #[tokio::test]
    async fn unpaid_bill_cutoff_is_exclusive() {
        let repo = setup_test_db().await;
        insert_bill(&repo, "Acme Hosting", "2025-07-01", "2025-07-20", 12_000, "open").await;
        insert_bill(&repo, "Acme Hosting", "2025-07-01", "2025-08-01", 12_000, "open").await;
        insert_bill(&repo, "Print Shop", "2025-07-01", "2025-07-10", 8_000, "paid").await;

        let cutoff = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert_eq!(repo.unpaid_bill_count_due_before(cutoff).await, Ok(1));
    }

    #[tokio::test]
    async fn failed_payments_are_scoped_to_the_month() {
        let repo = setup_test_db().await;
        insert_payment(&repo, "2025-07-05", 20_000, "payment", "failed").await;
        insert_payment(&repo, "2025-07-06", 20_000, "payment", "completed").await;
        insert_payment(&repo, "2025-06-28", 20_000, "payment", "failed").await;

        assert_eq!(repo.failed_payment_count(2025, 7).await, Ok(1));
    }

    #[tokio::test]
    async fn pending_refunds_count_across_all_months() {
        let repo = setup_test_db().await;
        insert_payment(&repo, "2025-05-01", -9_000, "refund", "pending").await;
        insert_payment(&repo, "2025-07-02", -4_000, "refund", "pending").await;
        insert_payment(&repo, "2025-07-03", -4_000, "refund", "completed").await;

        assert_eq!(repo.pending_refund_count().await, Ok(2));
    }

    #[tokio::test]
    async fn large_payments_compare_absolute_amounts() {
        let repo = setup_test_db().await;
        insert_payment(&repo, "2025-07-08", 1_500_000, "payment", "completed").await;
        insert_payment(&repo, "2025-07-09", -1_200_000, "refund", "completed").await;
        insert_payment(&repo, "2025-07-10", 999_999, "payment", "completed").await;

        assert_eq!(repo.large_payment_count(2025, 7, 1_000_000).await, Ok(2));
    }

    #[tokio::test]
    async fn payment_at_exactly_the_threshold_is_not_large() {
        let repo = setup_test_db().await;
        insert_payment(&repo, "2025-07-08", 1_000_000, "payment", "completed").await;
        insert_payment(&repo, "2025-07-09", 1_000_001, "payment", "completed").await;

        assert_eq!(repo.large_payment_count(2025, 7, 1_000_000).await, Ok(1));
    }

    #[tokio::test]
    async fn duplicate_groups_match_on_company_date_and_total() {
        let repo = setup_test_db().await;
        insert_invoice(&repo, 7, "INV-202507-0001", "2025-07-01", 42_000, "open", true).await;
        insert_invoice(&repo, 7, "INV-202507-0002", "2025-07-01", 42_000, "open", true).await;
        insert_invoice(&repo, 7, "INV-202507-0003", "2025-07-01", 43_000, "open", true).await;
        insert_invoice(&repo, 8, "INV-202507-0004", "2025-07-01", 42_000, "open", true).await;

        let groups = repo
            .duplicate_invoice_groups(2025, 7)
            .await
            .expect("Should query duplicates");

        assert_eq!(
            groups,
            vec![DuplicateInvoiceGroup {
                company_id: 7,
                invoice_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                total_cents: 42_000,
                count: 2,
            }]
        );
    }

    #[tokio::test]
    async fn invoice_numbers_come_back_sorted() {
        let repo = setup_test_db().await;
        insert_invoice(&repo, 1, "INV-202507-0003", "2025-07-20", 10_000, "open", true).await;
        insert_invoice(&repo, 1, "INV-202507-0001", "2025-07-02", 10_000, "open", true).await;
        insert_invoice(&repo, 1, "INV-202506-0009", "2025-06-20", 10_000, "open", true).await;

        let numbers = repo
            .invoice_numbers(2025, 7)
            .await
            .expect("Should list invoice numbers");

        assert_eq!(numbers, vec!["INV-202507-0001", "INV-202507-0003"]);
    }

    #[tokio::test]
    async fn summary_totals_exclude_void_documents() {
        let repo = setup_test_db().await;
        insert_invoice(&repo, 1, "INV-202507-0001", "2025-07-02", 100_000, "paid", true).await;
        insert_invoice(&repo, 1, "INV-202507-0002", "2025-07-03", 50_000, "open", true).await;
        insert_invoice(&repo, 1, "INV-202507-0003", "2025-07-04", 99_000, "void", true).await;
        insert_bill(&repo, "Acme Hosting", "2025-07-05", "2025-08-04", 30_000, "paid").await;
        insert_bill(&repo, "Print Shop", "2025-07-06", "2025-08-05", 20_000, "open").await;
        insert_bill(&repo, "Print Shop", "2025-07-07", "2025-08-06", 5_000, "void").await;
        insert_bank_transaction(&repo, "2025-07-08", 80_000, true).await;
        insert_bank_transaction(&repo, "2025-07-09", -20_000, true).await;

        assert_eq!(repo.invoice_total_cents(2025, 7).await, Ok(150_000));
        assert_eq!(repo.bill_total_cents(2025, 7).await, Ok(50_000));
        assert_eq!(repo.outstanding_receivable_cents().await, Ok(50_000));
        assert_eq!(repo.outstanding_payable_cents().await, Ok(20_000));
        assert_eq!(repo.bank_balance_cents().await, Ok(60_000));
    }

    #[tokio::test]
    async fn invalid_period_is_a_database_error() {
        let repo = setup_test_db().await;

        let result = repo.unsent_invoice_count(2025, 13).await;

        assert!(matches!(result, Err(RepositoryError::Database(_))));
    }
}
