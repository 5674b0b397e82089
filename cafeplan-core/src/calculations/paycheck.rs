//! Before/after paycheck comparison.
//!
//! Composes FICA, federal, state, and local withholding into two scenarios:
//! no Section 125 deduction versus the safe deduction from the
//! affordability calculator. Intermediate sums keep full precision; values
//! are rounded once, when the result is assembled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::fica::fica;
use crate::calculations::federal::federal_tax;
use crate::calculations::local::{LocalTax, LocalTaxLocation};
use crate::calculations::section125::AffordabilityResult;
use crate::calculations::state::state_tax;
use crate::models::{Employee, FederalWithholding, PlanConfig, StateWithholding};

/// One paycheck scenario (either side of the comparison).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaycheckScenario {
    pub gross_pay: Decimal,
    pub benefit_deduction: Decimal,
    pub fica: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub local_tax: Decimal,
    pub total_tax: Decimal,
    /// Gross less taxes; the after side also nets out the employee fee.
    pub net_pay: Decimal,
}

/// The before/after comparison shown to the employee, plus the fee and
/// savings split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaycheckComparison {
    pub before: PaycheckScenario,
    pub after: PaycheckScenario,

    /// Per-paycheck fee shares of the benefit amount.
    pub employee_fee: Decimal,
    pub employer_fee: Decimal,

    /// Employee tax saved net of the employee fee share.
    pub employee_savings: Decimal,

    /// Employer FICA match saved net of the employer fee share.
    pub employer_savings: Decimal,

    /// False when affordability marked the employee insufficient; the
    /// scenarios then both carry a zero benefit and the UI shows an
    /// ineligible state instead of a misleading comparison.
    pub is_eligible: bool,
}

/// FICA rates used by the comparison; callers normally pass
/// [`FicaRates::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FicaRates {
    pub ss_rate: Decimal,
    pub med_rate: Decimal,
}

impl Default for FicaRates {
    fn default() -> Self {
        Self {
            ss_rate: crate::calculations::fica::DEFAULT_SS_RATE,
            med_rate: crate::calculations::fica::DEFAULT_MEDICARE_RATE,
        }
    }
}

/// Builds the before/after comparison for one employee.
///
/// Performs no I/O and never errors: insufficient affordability degrades to
/// a zero-benefit comparison, and the underlying calculators default
/// missing amounts to zero.
pub fn compare(
    employee: &Employee,
    plan: &PlanConfig,
    affordability: &AffordabilityResult,
    federal_table: &FederalWithholding,
    state_config: &StateWithholding,
    local: &dyn LocalTax,
    rates: FicaRates,
) -> PaycheckComparison {
    let benefit = affordability.benefit_per_paycheck();
    let is_eligible = affordability.is_sufficient;

    let employee_fee = benefit * plan.billing_model.employee_rate() / Decimal::from(100);
    let employer_fee = benefit * plan.billing_model.employer_rate() / Decimal::from(100);

    // The fee rides through the after scenario at full precision so its
    // net pay is rounded exactly once.
    let before = scenario(
        employee,
        Decimal::ZERO,
        Decimal::ZERO,
        federal_table,
        state_config,
        local,
        rates,
    );
    let after = scenario(
        employee,
        benefit,
        employee_fee,
        federal_table,
        state_config,
        local,
        rates,
    );

    // Employer saves its FICA match on the deducted wages, less its fee.
    let employer_savings = before.fica - after.fica - employer_fee;
    let employee_savings = before.total_tax - after.total_tax - employee_fee;

    PaycheckComparison {
        before,
        after,
        employee_fee: round_half_up(employee_fee),
        employer_fee: round_half_up(employer_fee),
        employee_savings: round_half_up(employee_savings),
        employer_savings: round_half_up(employer_savings),
        is_eligible,
    }
}

fn scenario(
    employee: &Employee,
    benefit: Decimal,
    fee: Decimal,
    federal_table: &FederalWithholding,
    state_config: &StateWithholding,
    local: &dyn LocalTax,
    rates: FicaRates,
) -> PaycheckScenario {
    let periods = Decimal::from(employee.pay_frequency.periods_per_year());
    let gross = employee.gross_pay.max(Decimal::ZERO);

    let fica_result = fica(gross, benefit, rates.ss_rate, rates.med_rate);
    let federal = federal_tax(
        gross,
        benefit,
        employee.filing_status,
        employee.dependents,
        employee.pay_frequency.periods_per_year(),
        federal_table,
    );
    let state = state_tax(
        non_negative(gross - benefit),
        employee.dependents,
        employee.pay_frequency.periods_per_year(),
        state_config,
    );

    let location = LocalTaxLocation {
        residence_state: &employee.residence_state,
        residence_city: employee.residence_city.as_deref(),
        residence_county: employee.residence_county.as_deref(),
        work_state: employee.work_state.as_deref(),
        work_city: employee.work_city.as_deref(),
    };
    let annual_gross = non_negative(gross - benefit) * periods;
    let local_tax = local.annual_local_tax(annual_gross, &location) / periods;

    let total_tax = fica_result.fica + federal + state + local_tax;

    PaycheckScenario {
        gross_pay: gross,
        benefit_deduction: round_half_up(benefit),
        fica: fica_result.fica,
        federal_tax: federal,
        state_tax: state,
        local_tax: round_half_up(local_tax),
        total_tax: round_half_up(total_tax),
        net_pay: round_half_up(gross - total_tax - fee),
    }
}
