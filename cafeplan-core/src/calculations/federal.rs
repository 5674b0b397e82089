//! Federal income tax withholding, IRS Pub 15-T percentage method.
//!
//! Per-paycheck wages are annualized, reduced by the standard deduction and
//! the dependent allowance, then taxed with the base-tax-plus-overage
//! formula: the highest bracket whose floor is at or under annual taxable
//! income supplies a precomputed base tax plus a marginal rate on the
//! overage. The state calculator uses marginal summation instead; the two
//! follow their respective source formulas and must not be unified.

use rust_decimal::Decimal;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{
    DEPENDENT_ALLOWANCE, FederalWithholding, FilingStatus, federal_standard_deduction,
};

/// Flat fallback rate applied when no bracket table is configured (12%).
const FALLBACK_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// Computes per-paycheck federal income tax withholding.
///
/// `benefit` is the Section 125 pre-tax deduction for the period. With an
/// empty bracket table the calculation falls back to a flat 12% on
/// per-period taxable wages; this is a documented approximation for
/// companies that have not loaded a withholding table yet, not an error.
pub fn federal_tax(
    per_pay_gross: Decimal,
    benefit: Decimal,
    filing_status: FilingStatus,
    dependents: u32,
    periods_per_year: u32,
    table: &FederalWithholding,
) -> Decimal {
    let periods = Decimal::from(periods_per_year.max(1));
    let standard_deduction = federal_standard_deduction(filing_status);

    if table.is_empty() {
        let per_period_taxable =
            non_negative(per_pay_gross - benefit - standard_deduction / periods);
        return round_half_up(per_period_taxable * FALLBACK_RATE);
    }

    let annual_wages = (per_pay_gross - benefit) * periods;
    let dependent_allowance = DEPENDENT_ALLOWANCE * Decimal::from(dependents);
    let annual_taxable = non_negative(annual_wages - standard_deduction - dependent_allowance);

    // Highest bracket whose floor is at or under taxable income.
    let bracket = table
        .brackets()
        .iter()
        .rev()
        .find(|b| b.over <= annual_taxable);

    let annual_tax = match bracket {
        Some(b) => b.base_tax + (annual_taxable - b.over) * b.rate,
        None => Decimal::ZERO,
    };

    round_half_up(annual_tax / periods)
}
