use std::collections::HashMap;
use std::io::Read;

use cafeplan_core::{
    FederalBracket, FederalWithholding, FilingStatus, LedgerRepository, RepositoryError,
    StateBracket, StateMethod, StateWithholding,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading withholding data.
#[derive(Debug, Error, PartialEq)]
pub enum WithholdingLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid filing status: {0}")]
    InvalidFilingStatus(String),

    #[error("Invalid withholding method '{1}' for state '{0}'")]
    InvalidMethod(String, String),

    #[error("State '{0}' has conflicting rows: {1}")]
    InconsistentState(String, String),

    #[error("Invalid withholding config: {0}")]
    InvalidConfig(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for WithholdingLoaderError {
    fn from(err: csv::Error) -> Self {
        WithholdingLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the federal brackets CSV file.
///
/// One row per bracket of the annualized percentage-method table:
/// - `tax_year`: The tax year (e.g., 2024)
/// - `filing_status`: `single`, `married`, or `head`
/// - `over`: Annual taxable income floor for this bracket
/// - `base_tax`: Tax owed on income up to `over`
/// - `rate`: The marginal rate on income above `over` (e.g., 0.12)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FederalBracketRecord {
    pub tax_year: i32,
    pub filing_status: String,
    pub over: Decimal,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

/// A single record from the state withholding CSV file.
///
/// States appear once per bracket; `none` and `flat` states are a single
/// row. Columns:
/// - `state`: Two-letter state code
/// - `method`: `none`, `flat`, or `brackets`
/// - `over`: Bracket floor (brackets method only, empty otherwise)
/// - `rate`: Flat rate or bracket rate (empty for `none`)
/// - `standard_deduction` / `personal_exemption` / `dependent_exemption`:
///   Annual amounts, repeated identically on every row for the state
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateWithholdingRecord {
    pub state: String,
    pub method: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub over: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub rate: Option<Decimal>,
    pub standard_deduction: Decimal,
    pub personal_exemption: Decimal,
    pub dependent_exemption: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for withholding configuration from CSV files.
///
/// Reads CSV data and writes it through the [`LedgerRepository`] trait, so
/// it works with any registered database backend. Loading is idempotent:
/// federal tables are replaced per (year, status) and state configs are
/// upserted whole.
pub struct WithholdingLoader;

impl WithholdingLoader {
    /// Parse federal bracket records from a CSV reader.
    pub fn parse_federal<R: Read>(
        reader: R,
    ) -> Result<Vec<FederalBracketRecord>, WithholdingLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: FederalBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load federal bracket records into the database.
    ///
    /// Records are grouped by (tax_year, filing_status); each group replaces
    /// whatever the database held for that combination. Returns the number of
    /// brackets written.
    pub async fn load_federal<R: LedgerRepository>(
        repo: &R,
        records: &[FederalBracketRecord],
    ) -> Result<usize, WithholdingLoaderError> {
        let mut groups: HashMap<(i32, FilingStatus), Vec<&FederalBracketRecord>> = HashMap::new();

        for record in records {
            let filing_status = FilingStatus::parse(&record.filing_status).ok_or_else(|| {
                WithholdingLoaderError::InvalidFilingStatus(record.filing_status.clone())
            })?;
            groups
                .entry((record.tax_year, filing_status))
                .or_default()
                .push(record);
        }

        let mut inserted = 0;
        for ((tax_year, filing_status), group_records) in groups {
            let brackets = group_records
                .iter()
                .map(|record| FederalBracket {
                    over: record.over,
                    base_tax: record.base_tax,
                    rate: record.rate,
                })
                .collect();

            let table = FederalWithholding::new(tax_year, filing_status, brackets);
            inserted += repo.replace_federal_withholding(&table).await?;
        }

        Ok(inserted)
    }

    /// Parse state withholding records from a CSV reader.
    pub fn parse_states<R: Read>(
        reader: R,
    ) -> Result<Vec<StateWithholdingRecord>, WithholdingLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: StateWithholdingRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load state withholding records into the database.
    ///
    /// Rows are grouped by state; every row of a state must agree on method
    /// and deduction amounts. Returns the number of states upserted.
    pub async fn load_states<R: LedgerRepository>(
        repo: &R,
        records: &[StateWithholdingRecord],
    ) -> Result<usize, WithholdingLoaderError> {
        let mut groups: HashMap<String, Vec<&StateWithholdingRecord>> = HashMap::new();
        for record in records {
            groups
                .entry(record.state.clone())
                .or_default()
                .push(record);
        }

        let mut upserted = 0;
        for (state, rows) in groups {
            let config = build_state_config(&state, &rows)?;
            repo.upsert_state_withholding(&config).await?;
            upserted += 1;
        }

        Ok(upserted)
    }
}

fn build_state_config(
    state: &str,
    rows: &[&StateWithholdingRecord],
) -> Result<StateWithholding, WithholdingLoaderError> {
    let first = rows[0];
    for row in rows {
        if row.method != first.method
            || row.standard_deduction != first.standard_deduction
            || row.personal_exemption != first.personal_exemption
            || row.dependent_exemption != first.dependent_exemption
        {
            return Err(WithholdingLoaderError::InconsistentState(
                state.to_string(),
                "method and deduction columns must match on every row".to_string(),
            ));
        }
    }

    let method = match first.method.as_str() {
        "none" => {
            if rows.len() > 1 {
                return Err(WithholdingLoaderError::InconsistentState(
                    state.to_string(),
                    "method 'none' takes a single row".to_string(),
                ));
            }
            StateMethod::None
        }
        "flat" => {
            if rows.len() > 1 {
                return Err(WithholdingLoaderError::InconsistentState(
                    state.to_string(),
                    "method 'flat' takes a single row".to_string(),
                ));
            }
            let rate = first.rate.ok_or_else(|| {
                WithholdingLoaderError::InvalidConfig(format!(
                    "state '{}' uses the flat method but has no rate",
                    state
                ))
            })?;
            StateMethod::Flat { rate }
        }
        "brackets" => {
            let mut brackets = Vec::new();
            for row in rows {
                let (Some(over), Some(rate)) = (row.over, row.rate) else {
                    return Err(WithholdingLoaderError::InvalidConfig(format!(
                        "state '{}' bracket rows need both 'over' and 'rate'",
                        state
                    )));
                };
                brackets.push(StateBracket { over, rate });
            }
            StateMethod::Brackets { brackets }
        }
        other => {
            return Err(WithholdingLoaderError::InvalidMethod(
                state.to_string(),
                other.to_string(),
            ));
        }
    };

    StateWithholding::new(
        state,
        method,
        first.standard_deduction,
        first.personal_exemption,
        first.dependent_exemption,
    )
    .map_err(|e| WithholdingLoaderError::InvalidConfig(e.to_string()))
}
