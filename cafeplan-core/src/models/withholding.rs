use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::employee::FilingStatus;

/// 2024 federal standard deduction by filing status.
pub fn federal_standard_deduction(filing_status: FilingStatus) -> Decimal {
    match filing_status {
        FilingStatus::Single => Decimal::from(14600),
        FilingStatus::Married => Decimal::from(29200),
        FilingStatus::HeadOfHousehold => Decimal::from(21900),
    }
}

/// Annual withholding allowance per claimed dependent (2024).
pub const DEPENDENT_ALLOWANCE: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

/// One row of the federal percentage-method table: income at or above
/// `over` owes `base_tax` plus `rate` on the amount over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalBracket {
    pub over: Decimal,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

/// The annual federal withholding table for one tax year and filing status.
///
/// The constructor sorts rows ascending by `over`, so calculators can rely
/// on order without re-sorting per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalWithholding {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    brackets: Vec<FederalBracket>,
}

impl FederalWithholding {
    pub fn new(
        tax_year: i32,
        filing_status: FilingStatus,
        mut brackets: Vec<FederalBracket>,
    ) -> Self {
        brackets.sort_by(|a, b| a.over.cmp(&b.over));
        Self {
            tax_year,
            filing_status,
            brackets,
        }
    }

    /// Brackets in ascending order of `over`.
    pub fn brackets(&self) -> &[FederalBracket] {
        &self.brackets
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }
}

/// How a state computes income tax withholding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateMethod {
    /// No state income tax.
    None,
    /// Flat rate on annual taxable income.
    Flat { rate: Decimal },
    /// Progressive marginal brackets on annual taxable income.
    Brackets { brackets: Vec<StateBracket> },
}

/// One marginal state bracket: `rate` applies to income above `over`, up to
/// the next bracket's floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBracket {
    pub over: Decimal,
    pub rate: Decimal,
}

/// Errors raised when constructing a [`StateWithholding`] config.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithholdingConfigError {
    #[error("state '{0}' has method 'brackets' but no bracket rows")]
    EmptyBrackets(String),

    #[error("state '{0}' has a negative rate {1}")]
    NegativeRate(String, Decimal),
}

/// State withholding configuration for one state.
///
/// Bracket rows are validated and sorted ascending by `over` once here, at
/// load time. Input order is not trusted; calculator code is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWithholding {
    pub state: String,
    method: StateMethod,
    pub standard_deduction: Decimal,
    pub personal_exemption: Decimal,
    pub dependent_exemption: Decimal,
}

impl StateWithholding {
    pub fn new(
        state: impl Into<String>,
        method: StateMethod,
        standard_deduction: Decimal,
        personal_exemption: Decimal,
        dependent_exemption: Decimal,
    ) -> Result<Self, WithholdingConfigError> {
        let state = state.into();
        let method = match method {
            StateMethod::None => StateMethod::None,
            StateMethod::Flat { rate } => {
                if rate < Decimal::ZERO {
                    return Err(WithholdingConfigError::NegativeRate(state, rate));
                }
                StateMethod::Flat { rate }
            }
            StateMethod::Brackets { mut brackets } => {
                if brackets.is_empty() {
                    return Err(WithholdingConfigError::EmptyBrackets(state));
                }
                if let Some(bad) = brackets.iter().find(|b| b.rate < Decimal::ZERO) {
                    return Err(WithholdingConfigError::NegativeRate(state, bad.rate));
                }
                brackets.sort_by(|a, b| a.over.cmp(&b.over));
                StateMethod::Brackets { brackets }
            }
        };
        Ok(Self {
            state,
            method,
            standard_deduction,
            personal_exemption,
            dependent_exemption,
        })
    }

    /// A no-income-tax config for `state`.
    pub fn no_tax(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            method: StateMethod::None,
            standard_deduction: Decimal::ZERO,
            personal_exemption: Decimal::ZERO,
            dependent_exemption: Decimal::ZERO,
        }
    }

    pub fn method(&self) -> &StateMethod {
        &self.method
    }
}
