use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::employee::FilingStatus;

/// Default safety cap: at most 50% of monthly gross may go to the
/// Section 125 deduction.
pub const DEFAULT_SAFETY_CAP_PERCENT: u32 = 50;

/// How the administration fee is split between employee and employer.
///
/// Each model fixes an employee and employer fee rate, expressed as a
/// percentage of the monthly benefit amount. The set is fixed by the
/// service agreement; the two `Custom*` models also switch the tier lookup
/// over to the company's own bucket amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingModel {
    /// Employer absorbs the full 7.5% fee.
    EmployerPays,
    /// Fee split evenly, 3.75% each side.
    SplitEven,
    /// Custom bucket amounts; employee pays the legacy 6% fee.
    CustomEmployee,
    /// Custom bucket amounts; fee split evenly at 3% each side.
    CustomSplit,
}

impl BillingModel {
    /// Employee fee rate, as a percentage of the benefit amount.
    pub fn employee_rate(&self) -> Decimal {
        match self {
            Self::EmployerPays => Decimal::ZERO,
            Self::SplitEven => Decimal::new(375, 2),
            Self::CustomEmployee => Decimal::from(6),
            Self::CustomSplit => Decimal::from(3),
        }
    }

    /// Employer fee rate, as a percentage of the benefit amount.
    pub fn employer_rate(&self) -> Decimal {
        match self {
            Self::EmployerPays => Decimal::new(75, 1),
            Self::SplitEven => Decimal::new(375, 2),
            Self::CustomEmployee => Decimal::ZERO,
            Self::CustomSplit => Decimal::from(3),
        }
    }

    /// Whether this model uses the company's custom bucket amounts instead
    /// of the pricing tier table.
    pub fn uses_custom_amounts(&self) -> bool {
        matches!(self, Self::CustomEmployee | Self::CustomSplit)
    }
}

/// Monthly Section 125 target amounts for the four filing-status/dependents
/// buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAmounts {
    pub single_no_dependents: Decimal,
    pub single_with_dependents: Decimal,
    pub married_no_dependents: Decimal,
    pub married_with_dependents: Decimal,
}

impl TierAmounts {
    /// Bucket lookup. Head-of-household falls into the married buckets for
    /// every shipped tier; that mapping is tier data, so a tier that wants
    /// a different mapping overrides `PricingTier::amounts` wholesale.
    pub fn target(
        &self,
        filing_status: FilingStatus,
        dependents: u32,
    ) -> Decimal {
        let has_dependents = dependents > 0;
        match (filing_status, has_dependents) {
            (FilingStatus::Single, false) => self.single_no_dependents,
            (FilingStatus::Single, true) => self.single_with_dependents,
            (FilingStatus::Married | FilingStatus::HeadOfHousehold, false) => {
                self.married_no_dependents
            }
            (FilingStatus::Married | FilingStatus::HeadOfHousehold, true) => {
                self.married_with_dependents
            }
        }
    }
}

/// Named pricing tiers. Each tier is a fixed table of monthly target
/// amounts; the enum keeps tier coverage checkable at compile time instead
/// of dispatching on tier-name strings at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingTier {
    StateSchool,
    Tier2025,
    Pre2025,
    Original6Pct,
}

impl PricingTier {
    pub fn amounts(&self) -> TierAmounts {
        match self {
            Self::StateSchool => TierAmounts {
                single_no_dependents: Decimal::from(1100),
                single_with_dependents: Decimal::from(1300),
                married_no_dependents: Decimal::from(1300),
                married_with_dependents: Decimal::from(1500),
            },
            Self::Tier2025 => TierAmounts {
                single_no_dependents: Decimal::from(1300),
                single_with_dependents: Decimal::from(1500),
                married_no_dependents: Decimal::from(1500),
                married_with_dependents: Decimal::from(1700),
            },
            Self::Pre2025 => TierAmounts {
                single_no_dependents: Decimal::from(1200),
                single_with_dependents: Decimal::from(1400),
                married_no_dependents: Decimal::from(1400),
                married_with_dependents: Decimal::from(1600),
            },
            Self::Original6Pct => TierAmounts {
                single_no_dependents: Decimal::from(950),
                single_with_dependents: Decimal::from(1050),
                married_no_dependents: Decimal::from(1050),
                married_with_dependents: Decimal::from(1150),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateSchool => "state_school",
            Self::Tier2025 => "2025",
            Self::Pre2025 => "pre_2025",
            Self::Original6Pct => "original_6pct",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "state_school" => Some(Self::StateSchool),
            "2025" => Some(Self::Tier2025),
            "pre_2025" => Some(Self::Pre2025),
            "original_6pct" => Some(Self::Original6Pct),
            _ => None,
        }
    }
}

/// Company-level benefit plan configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub billing_model: BillingModel,

    pub pricing_tier: PricingTier,

    /// Maximum percent of monthly gross payable as the Section 125
    /// deduction. Defaults to [`DEFAULT_SAFETY_CAP_PERCENT`].
    pub safety_cap_percent: u32,

    /// Bucket overrides used when the billing model is one of the custom
    /// variants. Ignored otherwise.
    pub custom_amounts: Option<TierAmounts>,
}

impl PlanConfig {
    pub fn new(
        billing_model: BillingModel,
        pricing_tier: PricingTier,
    ) -> Self {
        Self {
            billing_model,
            pricing_tier,
            safety_cap_percent: DEFAULT_SAFETY_CAP_PERCENT,
            custom_amounts: None,
        }
    }

    /// Monthly target amount for the employee's bucket, honoring custom
    /// overrides when the billing model calls for them.
    pub fn target_monthly(
        &self,
        filing_status: FilingStatus,
        dependents: u32,
    ) -> Decimal {
        let table = match (self.billing_model.uses_custom_amounts(), &self.custom_amounts) {
            (true, Some(custom)) => *custom,
            _ => self.pricing_tier.amounts(),
        };
        table.target(filing_status, dependents)
    }
}
