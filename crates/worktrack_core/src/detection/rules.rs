//! Built-in company detection rules.
//!
//! Each rule is a `(priority, predicate, extractor)` triple: `applies`
//! decides whether the rule looks at the input at all, `select` extracts a
//! company from the work context. A rule that applies but selects nothing
//! lets evaluation continue with the next rule.

use crate::model::company::Company;
use crate::model::time_record::DetectionHints;
use crate::service::work_context::WorkContext;

pub const SINGLE_COMPANY_PRIORITY: u32 = 10;
pub const EXPLICIT_COMPANY_PRIORITY: u32 = 20;
pub const IMPORT_SOURCE_PRIORITY: u32 = 30;
pub const PROJECT_CODE_PRIORITY: u32 = 40;
pub const CLIENT_ID_PRIORITY: u32 = 50;
pub const PRIMARY_COMPANY_PRIORITY: u32 = 60;

/// One ordered step of company detection.
pub trait DetectionRule: Send + Sync {
    /// Stable rule id used in logs and detection outcomes.
    fn name(&self) -> &'static str;
    /// Lower values run first.
    fn priority(&self) -> u32;
    /// Returns whether this rule should inspect the input.
    fn applies(&self, context: &WorkContext, hints: &DetectionHints) -> bool;
    /// Picks a company from `context`, or `None` to defer to later rules.
    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        hints: &DetectionHints,
    ) -> Option<&'ctx Company>;
}

/// Employees with exactly one available company always resolve to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleCompanyRule;

impl DetectionRule for SingleCompanyRule {
    fn name(&self) -> &'static str {
        "single_company"
    }

    fn priority(&self) -> u32 {
        SINGLE_COMPANY_PRIORITY
    }

    fn applies(&self, context: &WorkContext, _hints: &DetectionHints) -> bool {
        context.available_companies.len() == 1
    }

    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        _hints: &DetectionHints,
    ) -> Option<&'ctx Company> {
        context.available_companies.first()
    }
}

/// Honors an explicitly requested company when the employee may use it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitCompanyRule;

impl DetectionRule for ExplicitCompanyRule {
    fn name(&self) -> &'static str {
        "explicit_company"
    }

    fn priority(&self) -> u32 {
        EXPLICIT_COMPANY_PRIORITY
    }

    fn applies(&self, _context: &WorkContext, hints: &DetectionHints) -> bool {
        hints.company_id.is_some()
    }

    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        hints: &DetectionHints,
    ) -> Option<&'ctx Company> {
        hints.company_id.and_then(|id| context.company(id))
    }
}

/// Maps a known external system tag to the company named after it.
#[derive(Debug, Clone, Default)]
pub struct ImportSourceRule {
    known_sources: Vec<String>,
}

impl ImportSourceRule {
    pub fn new(known_sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            known_sources: known_sources
                .into_iter()
                .map(|value| value.into().trim().to_string())
                .filter(|value| !value.is_empty())
                .collect(),
        }
    }

    /// Returns the configured external system name matching `tag`.
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn known_source(&self, tag: &str) -> Option<&str> {
        let tag = tag.trim();
        self.known_sources
            .iter()
            .map(String::as_str)
            .find(|source| source.eq_ignore_ascii_case(tag))
    }
}

impl DetectionRule for ImportSourceRule {
    fn name(&self) -> &'static str {
        "import_source"
    }

    fn priority(&self) -> u32 {
        IMPORT_SOURCE_PRIORITY
    }

    fn applies(&self, _context: &WorkContext, hints: &DetectionHints) -> bool {
        hints
            .import_source()
            .and_then(|tag| self.known_source(tag))
            .is_some()
    }

    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        hints: &DetectionHints,
    ) -> Option<&'ctx Company> {
        let source = self.known_source(hints.import_source()?)?;
        context
            .available_companies
            .iter()
            .find(|company| contains_ignore_case(&company.name, source))
    }
}

/// Matches a project code against company names and registration codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectCodeRule;

impl DetectionRule for ProjectCodeRule {
    fn name(&self) -> &'static str {
        "project_code"
    }

    fn priority(&self) -> u32 {
        PROJECT_CODE_PRIORITY
    }

    fn applies(&self, _context: &WorkContext, hints: &DetectionHints) -> bool {
        hints.project_code().is_some()
    }

    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        hints: &DetectionHints,
    ) -> Option<&'ctx Company> {
        let code = hints.project_code()?;
        context.available_companies.iter().find(|company| {
            contains_ignore_case(&company.name, code)
                || contains_ignore_case(&company.registration_code, code)
        })
    }
}

/// Matches a client identifier against company names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIdRule;

impl DetectionRule for ClientIdRule {
    fn name(&self) -> &'static str {
        "client_id"
    }

    fn priority(&self) -> u32 {
        CLIENT_ID_PRIORITY
    }

    fn applies(&self, _context: &WorkContext, hints: &DetectionHints) -> bool {
        hints.client_id().is_some()
    }

    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        hints: &DetectionHints,
    ) -> Option<&'ctx Company> {
        let client_id = hints.client_id()?;
        context
            .available_companies
            .iter()
            .find(|company| contains_ignore_case(&company.name, client_id))
    }
}

/// Terminal rule: the employee's primary company.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryCompanyRule;

impl DetectionRule for PrimaryCompanyRule {
    fn name(&self) -> &'static str {
        "primary_company"
    }

    fn priority(&self) -> u32 {
        PRIMARY_COMPANY_PRIORITY
    }

    fn applies(&self, _context: &WorkContext, _hints: &DetectionHints) -> bool {
        true
    }

    fn select<'ctx>(
        &self,
        context: &'ctx WorkContext,
        _hints: &DetectionHints,
    ) -> Option<&'ctx Company> {
        Some(&context.primary_company)
    }
}

/// Case-insensitive substring test.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
