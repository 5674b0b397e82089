//! Local (city/county) tax seam.
//!
//! Local tax rules are jurisdiction data maintained outside this crate; the
//! core only needs an annual figure it can divide back down to the pay
//! period. Implementations decide residence-vs-work sourcing.

use rust_decimal::Decimal;

/// Where the employee lives and works, for local tax sourcing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalTaxLocation<'a> {
    pub residence_state: &'a str,
    pub residence_city: Option<&'a str>,
    pub residence_county: Option<&'a str>,
    pub work_state: Option<&'a str>,
    pub work_city: Option<&'a str>,
}

/// Collaborator computing annual local tax on annualized gross income.
pub trait LocalTax {
    fn annual_local_tax(
        &self,
        annual_gross: Decimal,
        location: &LocalTaxLocation<'_>,
    ) -> Decimal;
}

/// Null object for companies with no local tax exposure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalTax;

impl LocalTax for NoLocalTax {
    fn annual_local_tax(
        &self,
        _annual_gross: Decimal,
        _location: &LocalTaxLocation<'_>,
    ) -> Decimal {
        Decimal::ZERO
    }
}

/// Flat-rate local tax on annual gross, the common city earnings tax shape.
#[derive(Debug, Clone, Copy)]
pub struct FlatLocalTax {
    pub rate: Decimal,
}

impl LocalTax for FlatLocalTax {
    fn annual_local_tax(
        &self,
        annual_gross: Decimal,
        _location: &LocalTaxLocation<'_>,
    ) -> Decimal {
        annual_gross * self.rate
    }
}
