//! Pre-persistence checks for prospective time records.
//!
//! # Invariants
//! - Only an access violation sets `valid = false`.
//! - Hour-ratio overage and a missing project code are advisory: they are
//!   reported as issues/suggestions and never block the record.

use crate::model::company::CompanyType;
use crate::model::time_record::TimeRecord;
use crate::service::work_context::WorkContext;
use serde::Serialize;

/// Prefix of the issue emitted for access violations.
pub const ACCESS_DENIED_ISSUE_PREFIX: &str = "AccessDenied";

/// Outcome of validating one prospective time record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    fn accepted() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// Returns whether the result carries an access violation.
    pub fn is_access_denied(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.starts_with(ACCESS_DENIED_ISSUE_PREFIX))
    }
}

/// Weekly hour policy for one employee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourPolicy {
    pub contract_hours_per_week: f64,
    /// Multiplier over contract hours that triggers an overage issue.
    pub ratio_limit: f64,
}

impl HourPolicy {
    /// Maximum projected week hours before an overage issue is raised.
    /// `None` when the contract carries no hours.
    pub fn limit(&self) -> Option<f64> {
        (self.contract_hours_per_week > 0.0)
            .then(|| self.contract_hours_per_week * self.ratio_limit)
    }
}

/// Validates `record` against `context`.
///
/// `current_week_hours` is the already-recorded total for the ISO week of
/// `record.date`, excluding `record` itself.
pub fn evaluate(
    context: &WorkContext,
    record: &TimeRecord,
    current_week_hours: f64,
    policy: HourPolicy,
) -> ValidationResult {
    if let Some(company_id) = record.assigned_company_id {
        if !context.contains(company_id) {
            return ValidationResult {
                valid: false,
                issues: vec![format!(
                    "{ACCESS_DENIED_ISSUE_PREFIX}: company {company_id} is not available to employee {}",
                    context.employee_id
                )],
                suggestions: Vec::new(),
            };
        }
    }

    let mut result = ValidationResult::accepted();

    let projected = current_week_hours + record.total_hours();
    if let Some(limit) = policy.limit() {
        if projected > limit {
            result.issues.push(format!(
                "projected week total {projected:.1} h exceeds {limit:.1} h ({:.0}% of {:.1} h contract); projected is {:.1}% of contract",
                policy.ratio_limit * 100.0,
                policy.contract_hours_per_week,
                projected / policy.contract_hours_per_week * 100.0
            ));
        }
    }

    let target = context
        .company(record.effective_company_id(context.primary_company_id()))
        .unwrap_or(&context.primary_company);
    let has_project_code = record
        .project_code
        .as_deref()
        .is_some_and(|code| !code.trim().is_empty());
    if target.kind == CompanyType::Project && !has_project_code {
        result.suggestions.push(format!(
            "add a project code for time logged against project company `{}`",
            target.name
        ));
    }

    result
}
