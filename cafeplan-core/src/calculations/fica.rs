//! FICA (Social Security + Medicare) withholding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};

/// Employee-side Social Security rate (6.2%).
pub const DEFAULT_SS_RATE: Decimal = Decimal::from_parts(62, 0, 0, false, 3);

/// Employee-side Medicare rate (1.45%).
pub const DEFAULT_MEDICARE_RATE: Decimal = Decimal::from_parts(145, 0, 0, false, 4);

/// Per-paycheck FICA breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FicaResult {
    pub ss: Decimal,
    pub med: Decimal,
    /// Always `ss + med`.
    pub fica: Decimal,
}

/// Computes per-paycheck FICA on gross pay less the Section 125 pre-tax
/// deduction. Taxable wages are floored at zero.
///
/// The Social Security wage base cap is intentionally not modeled: these
/// figures are per-paycheck projections for benefit comparisons, not
/// year-to-date withholding, and the plan's target population sits well
/// under the cap.
pub fn fica(
    gross_pay: Decimal,
    benefit_deduction: Decimal,
    ss_rate: Decimal,
    med_rate: Decimal,
) -> FicaResult {
    let taxable = non_negative(gross_pay - benefit_deduction);
    let ss = round_half_up(taxable * ss_rate);
    let med = round_half_up(taxable * med_rate);
    FicaResult {
        ss,
        med,
        fica: ss + med,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_rates_match_statute() {
        assert_eq!(DEFAULT_SS_RATE, dec!(0.062));
        assert_eq!(DEFAULT_MEDICARE_RATE, dec!(0.0145));
    }

    #[test]
    fn fica_on_2000_gross_no_benefit() {
        let result = fica(dec!(2000), dec!(0), DEFAULT_SS_RATE, DEFAULT_MEDICARE_RATE);

        assert_eq!(result.ss, dec!(124.00));
        assert_eq!(result.med, dec!(29.00));
        assert_eq!(result.fica, dec!(153.00));
    }

    #[test]
    fn benefit_deduction_reduces_taxable_wages() {
        let without = fica(dec!(2000), dec!(0), DEFAULT_SS_RATE, DEFAULT_MEDICARE_RATE);
        let with = fica(dec!(2000), dec!(600), DEFAULT_SS_RATE, DEFAULT_MEDICARE_RATE);

        assert!(with.fica < without.fica);
        assert_eq!(with.ss, dec!(86.80));
        assert_eq!(with.med, dec!(20.30));
    }

    #[test]
    fn fica_equals_ss_plus_med() {
        let result = fica(
            dec!(1234.56),
            dec!(321.09),
            DEFAULT_SS_RATE,
            DEFAULT_MEDICARE_RATE,
        );

        assert_eq!(result.fica, result.ss + result.med);
    }

    #[test]
    fn deduction_exceeding_gross_yields_zero_not_negative() {
        let result = fica(dec!(500), dec!(800), DEFAULT_SS_RATE, DEFAULT_MEDICARE_RATE);

        assert_eq!(result.ss, dec!(0));
        assert_eq!(result.med, dec!(0));
        assert_eq!(result.fica, dec!(0));
    }
}
