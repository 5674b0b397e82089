use serde::{Deserialize, Serialize};

/// Severity class for a month-end check. Only critical failures block
/// closing the books; important and recommended failures are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckCategory {
    Critical,
    Important,
    Recommended,
}

/// Static text for one check: stable id plus the plain-language guidance
/// shown to the bookkeeper. Outcomes never surface raw errors; they surface
/// these strings with a pass/fail flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckDef {
    pub id: &'static str,
    pub category: CheckCategory,
    pub name: &'static str,
    pub description: &'static str,
    pub what_to_check: &'static str,
    pub how_to_fix: &'static str,
}

impl CheckDef {
    /// Builds an outcome for this check.
    pub fn outcome(
        &self,
        passed: bool,
        details: impl Into<String>,
        error_count: Option<i64>,
    ) -> ValidationCheck {
        ValidationCheck {
            id: self.id.to_string(),
            category: self.category,
            name: self.name.to_string(),
            description: self.description.to_string(),
            what_to_check: self.what_to_check.to_string(),
            how_to_fix: self.how_to_fix.to_string(),
            passed,
            details: details.into(),
            error_count,
        }
    }

    /// Outcome for a count-style check: zero offending rows passes.
    pub fn count_outcome(
        &self,
        offending: i64,
        pass_details: &str,
        fail_details: impl FnOnce(i64) -> String,
    ) -> ValidationCheck {
        if offending == 0 {
            self.outcome(true, pass_details, None)
        } else {
            self.outcome(false, fail_details(offending), Some(offending))
        }
    }
}

/// One evaluated check. Generated fresh on every validation run, never
/// persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub id: String,
    pub category: CheckCategory,
    pub name: String,
    pub description: String,
    pub what_to_check: String,
    pub how_to_fix: String,
    pub passed: bool,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<i64>,
}
