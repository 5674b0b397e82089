//! Payroll tax and Section 125 benefit calculators.
//!
//! Everything here is synchronous, side-effect-free arithmetic over plain
//! records: the caller loads the employee, plan, and withholding configs
//! and gets displayable results back.

pub mod common;
pub mod federal;
pub mod fica;
pub mod local;
pub mod paycheck;
pub mod section125;
pub mod state;

pub use federal::federal_tax;
pub use fica::{DEFAULT_MEDICARE_RATE, DEFAULT_SS_RATE, FicaResult, fica};
pub use local::{FlatLocalTax, LocalTax, LocalTaxLocation, NoLocalTax};
pub use paycheck::{FicaRates, PaycheckComparison, PaycheckScenario, compare};
pub use section125::{AffordabilityResult, MIN_VIABLE_MONTHLY, affordability};
pub use state::state_tax;
