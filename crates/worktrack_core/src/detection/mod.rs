//! Company detection for activities without an explicit company.
//!
//! # Responsibility
//! - Hold an ordered list of detection rules.
//! - Pick exactly one available company for an activity and its hints.
//!
//! # Invariants
//! - Rules run in ascending priority; the first rule that applies and
//!   selects a company wins.
//! - Detection is pure: identical `(context, hints)` always yields the same
//!   company.
//! - The result is always a member of the context's available companies;
//!   the primary company is the terminal fallback.

pub mod rules;

use crate::config::AttributionConfig;
use crate::model::company::Company;
use crate::model::time_record::DetectionHints;
use crate::service::work_context::WorkContext;
use rules::{
    ClientIdRule, DetectionRule, ExplicitCompanyRule, ImportSourceRule, PrimaryCompanyRule,
    ProjectCodeRule, SingleCompanyRule,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rule name reported when no registered rule selected a company.
pub const FALLBACK_RULE_NAME: &str = "fallback_primary";

/// Company picked by detection and the rule that picked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionOutcome<'ctx> {
    pub company: &'ctx Company,
    pub rule: &'static str,
}

/// Rule registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    DuplicateRuleName(&'static str),
    DuplicatePriority { priority: u32, existing: &'static str },
}

impl Display for DetectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateRuleName(name) => {
                write!(f, "detection rule already registered: {name}")
            }
            Self::DuplicatePriority { priority, existing } => write!(
                f,
                "detection priority {priority} already used by rule `{existing}`"
            ),
        }
    }
}

impl Error for DetectionError {}

/// Ordered detection rule chain.
#[derive(Default)]
pub struct CompanyDetectionEngine {
    rules: Vec<Box<dyn DetectionRule>>,
}

impl CompanyDetectionEngine {
    /// Creates an engine with no rules; detection falls back to the primary.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the standard six-rule chain.
    ///
    /// Built-ins are listed in ascending priority order.
    pub fn with_default_rules(config: &AttributionConfig) -> Self {
        Self {
            rules: vec![
                Box::new(SingleCompanyRule),
                Box::new(ExplicitCompanyRule),
                Box::new(ImportSourceRule::new(config.known_import_sources.iter().cloned())),
                Box::new(ProjectCodeRule),
                Box::new(ClientIdRule),
                Box::new(PrimaryCompanyRule),
            ],
        }
    }

    /// Registers one rule at its priority slot.
    pub fn register(&mut self, rule: Box<dyn DetectionRule>) -> Result<(), DetectionError> {
        if self.rules.iter().any(|existing| existing.name() == rule.name()) {
            return Err(DetectionError::DuplicateRuleName(rule.name()));
        }
        if let Some(existing) = self
            .rules
            .iter()
            .find(|existing| existing.priority() == rule.priority())
        {
            return Err(DetectionError::DuplicatePriority {
                priority: rule.priority(),
                existing: existing.name(),
            });
        }

        let index = self
            .rules
            .partition_point(|existing| existing.priority() < rule.priority());
        self.rules.insert(index, rule);
        Ok(())
    }

    /// Returns rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Picks the company for an activity described by `hints`.
    pub fn detect<'ctx>(
        &self,
        context: &'ctx WorkContext,
        hints: &DetectionHints,
    ) -> DetectionOutcome<'ctx> {
        for rule in &self.rules {
            if !rule.applies(context, hints) {
                continue;
            }
            if let Some(company) = rule.select(context, hints) {
                return DetectionOutcome {
                    company,
                    rule: rule.name(),
                };
            }
        }

        DetectionOutcome {
            company: &context.primary_company,
            rule: FALLBACK_RULE_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::rules::DetectionRule;
    use super::{CompanyDetectionEngine, DetectionError, FALLBACK_RULE_NAME};
    use crate::config::AttributionConfig;
    use crate::model::company::Company;
    use crate::model::time_record::DetectionHints;
    use crate::service::work_context::WorkContext;
    use uuid::Uuid;

    struct Fixture {
        context: WorkContext,
        primary: Company,
        build: Company,
        consulting: Company,
    }

    fn fixture() -> Fixture {
        let tenant = Uuid::new_v4();
        let primary = Company::employer(tenant, "Acme Holding", "556200-0001");
        let build = Company::project(tenant, primary.id, "Acme Build Visma", "556200-0002");
        let consulting = Company::project(tenant, primary.id, "Beta Consulting", "556200-0003");
        let context = WorkContext::new(
            Uuid::new_v4(),
            primary.clone(),
            vec![build.clone(), consulting.clone()],
            true,
        );
        Fixture {
            context,
            primary,
            build,
            consulting,
        }
    }

    fn engine() -> CompanyDetectionEngine {
        CompanyDetectionEngine::with_default_rules(&AttributionConfig::default())
    }

    #[test]
    fn default_rules_run_in_documented_order() {
        assert_eq!(
            engine().rule_names(),
            vec![
                "single_company",
                "explicit_company",
                "import_source",
                "project_code",
                "client_id",
                "primary_company",
            ]
        );
    }

    #[test]
    fn default_rule_priorities_strictly_ascend() {
        let engine = engine();
        let priorities: Vec<u32> = engine.rules.iter().map(|rule| rule.priority()).collect();
        assert!(priorities.windows(2).all(|pair| pair[0] < pair[1]), "{priorities:?}");
    }

    #[test]
    fn no_hints_resolve_to_primary() {
        let fixture = fixture();
        let outcome = engine().detect(&fixture.context, &DetectionHints::default());
        assert_eq!(outcome.company.id, fixture.primary.id);
        assert_eq!(outcome.rule, "primary_company");
    }

    #[test]
    fn explicit_company_beats_every_textual_hint() {
        let fixture = fixture();
        let hints = DetectionHints {
            company_id: Some(fixture.consulting.id),
            import_source: Some("visma".to_string()),
            project_code: Some("build".to_string()),
            client_id: Some("build".to_string()),
        };
        let outcome = engine().detect(&fixture.context, &hints);
        assert_eq!(outcome.company.id, fixture.consulting.id);
        assert_eq!(outcome.rule, "explicit_company");
    }

    #[test]
    fn foreign_explicit_company_falls_through_to_next_rules() {
        let fixture = fixture();
        let hints = DetectionHints {
            company_id: Some(Uuid::new_v4()),
            client_id: Some("beta".to_string()),
            ..DetectionHints::default()
        };
        let outcome = engine().detect(&fixture.context, &hints);
        assert_eq!(outcome.company.id, fixture.consulting.id);
        assert_eq!(outcome.rule, "client_id");
    }

    #[test]
    fn import_source_precedes_project_code() {
        let fixture = fixture();
        let hints = DetectionHints {
            import_source: Some("Visma".to_string()),
            project_code: Some("consulting".to_string()),
            ..DetectionHints::default()
        };
        let outcome = engine().detect(&fixture.context, &hints);
        assert_eq!(outcome.company.id, fixture.build.id);
        assert_eq!(outcome.rule, "import_source");
    }

    #[test]
    fn project_code_precedes_client_id() {
        let fixture = fixture();
        let hints = DetectionHints {
            project_code: Some("556200-0003".to_string()),
            client_id: Some("Build".to_string()),
            ..DetectionHints::default()
        };
        let outcome = engine().detect(&fixture.context, &hints);
        assert_eq!(outcome.company.id, fixture.consulting.id);
    }

    #[test]
    fn unmatched_hints_fall_back_to_primary() {
        let fixture = fixture();
        let hints = DetectionHints {
            import_source: Some("excel".to_string()),
            project_code: Some("zzz".to_string()),
            client_id: Some("nobody".to_string()),
            ..DetectionHints::default()
        };
        assert_eq!(
            engine().detect(&fixture.context, &hints).company.id,
            fixture.primary.id
        );
    }

    #[test]
    fn single_company_context_ignores_hints() {
        let tenant = Uuid::new_v4();
        let only = Company::employer(tenant, "Solo AB", "556300-0001");
        let context = WorkContext::new(Uuid::new_v4(), only.clone(), Vec::new(), true);
        let hints = DetectionHints {
            company_id: Some(Uuid::new_v4()),
            import_source: Some("fortnox".to_string()),
            project_code: Some("x".to_string()),
            client_id: Some("y".to_string()),
        };
        let outcome = engine().detect(&context, &hints);
        assert_eq!(outcome.company.id, only.id);
        assert_eq!(outcome.rule, "single_company");
    }

    #[test]
    fn detection_is_deterministic() {
        let fixture = fixture();
        let engine = engine();
        let hints = DetectionHints {
            client_id: Some("acme".to_string()),
            ..DetectionHints::default()
        };
        let first = engine.detect(&fixture.context, &hints).company.id;
        for _ in 0..10 {
            assert_eq!(engine.detect(&fixture.context, &hints).company.id, first);
        }
        // Primary comes first in available order, so "acme" matches it.
        assert_eq!(first, fixture.primary.id);
    }

    struct AlwaysSecondRule;

    impl DetectionRule for AlwaysSecondRule {
        fn name(&self) -> &'static str {
            "always_second"
        }

        fn priority(&self) -> u32 {
            15
        }

        fn applies(&self, _context: &WorkContext, _hints: &DetectionHints) -> bool {
            true
        }

        fn select<'ctx>(
            &self,
            context: &'ctx WorkContext,
            _hints: &DetectionHints,
        ) -> Option<&'ctx Company> {
            context.available_companies.get(1)
        }
    }

    #[test]
    fn custom_rule_is_inserted_by_priority() {
        let fixture = fixture();
        let mut engine = engine();
        engine.register(Box::new(AlwaysSecondRule)).unwrap();
        assert_eq!(engine.rule_names()[1], "always_second");

        let hints = DetectionHints {
            company_id: Some(fixture.consulting.id),
            ..DetectionHints::default()
        };
        assert_eq!(
            engine.detect(&fixture.context, &hints).company.id,
            fixture.build.id
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut engine = engine();
        engine.register(Box::new(AlwaysSecondRule)).unwrap();
        assert_eq!(
            engine.register(Box::new(AlwaysSecondRule)).unwrap_err(),
            DetectionError::DuplicateRuleName("always_second")
        );
    }

    #[test]
    fn empty_engine_falls_back_to_primary() {
        let fixture = fixture();
        let outcome =
            CompanyDetectionEngine::empty().detect(&fixture.context, &DetectionHints::default());
        assert_eq!(outcome.company.id, fixture.primary.id);
        assert_eq!(outcome.rule, FALLBACK_RULE_NAME);
    }
}
