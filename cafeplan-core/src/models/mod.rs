mod employee;
mod plan;
mod withholding;

pub use employee::{Employee, FilingStatus, PayFrequency};
pub use plan::{BillingModel, DEFAULT_SAFETY_CAP_PERCENT, PlanConfig, PricingTier, TierAmounts};
pub use withholding::{
    DEPENDENT_ALLOWANCE, FederalBracket, FederalWithholding, StateBracket, StateMethod,
    StateWithholding, WithholdingConfigError, federal_standard_deduction,
};
