//! State income tax withholding.
//!
//! States are configured as no-tax, flat-rate, or progressive brackets.
//! Progressive states use true marginal summation: each bracket taxes only
//! the slice of annual income between its floor and the next bracket's
//! floor. The federal calculator uses the base-plus-overage lookup instead;
//! both follow their respective source formulas.

use rust_decimal::Decimal;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{StateBracket, StateMethod, StateWithholding};

/// Computes per-paycheck state income tax withholding.
///
/// `per_pay_taxable` is per-period income after pre-tax deductions (the
/// caller subtracts the Section 125 benefit). Returns zero for no-tax
/// states. Bracket configs are sorted at load time by
/// [`StateWithholding::new`]; this function relies on that order.
pub fn state_tax(
    per_pay_taxable: Decimal,
    dependents: u32,
    periods_per_year: u32,
    config: &StateWithholding,
) -> Decimal {
    if matches!(config.method(), StateMethod::None) {
        return Decimal::ZERO;
    }

    let periods = Decimal::from(periods_per_year.max(1));
    let exemptions = config.standard_deduction
        + config.personal_exemption
        + config.dependent_exemption * Decimal::from(dependents);
    let annual_taxable = non_negative(per_pay_taxable * periods - exemptions);

    let annual_tax = match config.method() {
        StateMethod::None => Decimal::ZERO,
        StateMethod::Flat { rate } => annual_taxable * rate,
        StateMethod::Brackets { brackets } => marginal_tax(annual_taxable, brackets),
    };

    round_half_up(annual_tax / periods)
}

/// Sums tax on the portion of `annual_taxable` inside each bracket's span
/// (its floor up to the next bracket's floor, unbounded for the last).
fn marginal_tax(
    annual_taxable: Decimal,
    brackets: &[StateBracket],
) -> Decimal {
    let mut tax = Decimal::ZERO;
    for (i, bracket) in brackets.iter().enumerate() {
        if annual_taxable <= bracket.over {
            break;
        }
        let ceiling = brackets
            .get(i + 1)
            .map(|next| next.over)
            .unwrap_or(annual_taxable);
        let span_top = annual_taxable.min(ceiling);
        tax += (span_top - bracket.over) * bracket.rate;
    }
    tax
}
