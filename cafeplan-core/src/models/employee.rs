use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Federal filing status used for withholding and tier lookups.
///
/// The admin UI collects one of three statuses; married-filing-separately
/// is not offered by the plan paperwork and is folded into `Single` upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    Single,
    Married,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::HeadOfHousehold => "head",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "married" => Some(Self::Married),
            "head" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }
}

/// How often the employee is paid, with the standard annualization factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayFrequency {
    Weekly,
    Biweekly,
    Semimonthly,
    Monthly,
}

impl PayFrequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Self::Weekly => 52,
            Self::Biweekly => 26,
            Self::Semimonthly => 24,
            Self::Monthly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Semimonthly => "semimonthly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Self::Weekly),
            "biweekly" => Some(Self::Biweekly),
            "semimonthly" => Some(Self::Semimonthly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Calculation input for one employee. Immutable per calculation call;
/// record lifecycle (create/update/delete) is owned by the admin CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Gross pay per paycheck.
    pub gross_pay: Decimal,

    pub filing_status: FilingStatus,

    pub dependents: u32,

    pub pay_frequency: PayFrequency,

    /// Two-letter residence state code.
    pub residence_state: String,

    pub residence_city: Option<String>,

    pub residence_county: Option<String>,

    /// Work location, when it differs from residence. Local tax sourcing
    /// rules decide which side applies.
    pub work_state: Option<String>,

    pub work_city: Option<String>,
}
