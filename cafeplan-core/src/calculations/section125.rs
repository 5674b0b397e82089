//! Section 125 affordability: how much pre-tax deduction an employee's
//! paycheck can actually support.
//!
//! The pricing tier names a monthly target for the employee's bucket; the
//! safety cap limits the deduction to a percentage of monthly gross so a
//! paycheck is never hollowed out. The safe amount is the smaller of the
//! two, and falls to "insufficient" when it drops under the viability
//! floor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::models::{FilingStatus, PayFrequency, PlanConfig};

/// Minimum viable monthly deduction. Below this the plan is not worth
/// administering for the employee and the result is marked insufficient.
pub const MIN_VIABLE_MONTHLY: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Computed affordability for one employee. Derived on every call, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordabilityResult {
    pub gross_monthly: Decimal,

    /// The tier's monthly target for this employee's bucket.
    pub target_monthly: Decimal,

    /// min(target, gross × cap). What the plan will actually deduct.
    pub safe_monthly: Decimal,

    pub safe_per_paycheck: Decimal,

    /// What the tier target would require per paycheck. Reported even when
    /// insufficient so the shortfall is visible.
    pub target_per_paycheck: Decimal,

    /// False when gross pay is too low to support a meaningful deduction.
    /// Downstream calculators must then treat the benefit as zero.
    pub is_sufficient: bool,
}

impl AffordabilityResult {
    /// The per-paycheck deduction downstream calculators should apply:
    /// the safe amount, or zero when insufficient.
    pub fn benefit_per_paycheck(&self) -> Decimal {
        if self.is_sufficient {
            self.safe_per_paycheck
        } else {
            Decimal::ZERO
        }
    }
}

/// Computes the safe Section 125 deduction for one employee.
///
/// Total function: out-of-range inputs were rejected upstream by form
/// validation, and a zero or negative gross simply produces an
/// insufficient result with zeroed amounts.
pub fn affordability(
    plan: &PlanConfig,
    filing_status: FilingStatus,
    dependents: u32,
    per_pay_gross: Decimal,
    pay_frequency: PayFrequency,
) -> AffordabilityResult {
    let periods = Decimal::from(pay_frequency.periods_per_year());
    let twelve = Decimal::from(12);

    let target_monthly = plan.target_monthly(filing_status, dependents);
    let gross_monthly = per_pay_gross.max(Decimal::ZERO) * periods / twelve;
    let max_monthly = gross_monthly * Decimal::from(plan.safety_cap_percent) / Decimal::from(100);
    let safe_monthly = target_monthly.min(max_monthly);
    let is_sufficient = safe_monthly >= MIN_VIABLE_MONTHLY;

    AffordabilityResult {
        gross_monthly: round_half_up(gross_monthly),
        target_monthly: round_half_up(target_monthly),
        safe_monthly: round_half_up(safe_monthly),
        safe_per_paycheck: round_half_up(safe_monthly * twelve / periods),
        target_per_paycheck: round_half_up(target_monthly * twelve / periods),
        is_sufficient,
    }
}
