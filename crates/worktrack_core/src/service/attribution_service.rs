//! Attribution use-cases over company, employee and time record storage.
//!
//! # Responsibility
//! - Resolve work contexts and company hierarchies from stored state.
//! - Route activities to companies and validate time records before
//!   persistence.
//! - Guard multi-company assignment changes.
//!
//! # Invariants
//! - One service handle serves exactly one tenant; direct lookups of
//!   another tenant's employees fail with `Unauthorized`.
//! - Contexts and distributions are rebuilt per call and never cached.
//! - Log events carry ids and counts only.

use crate::calendar::iso_week::{iso_week, week_dates};
use crate::config::AttributionConfig;
use crate::detection::CompanyDetectionEngine;
use crate::model::assignment_audit::AssignmentAuditEntry;
use crate::model::company::{Company, CompanyId};
use crate::model::employee::{Employee, EmployeeId};
use crate::model::time_record::{DetectionHints, TimeRecord};
use crate::model::TenantId;
use crate::repo::company_repo::{CompanyRepository, SeedOutcome};
use crate::repo::employee_repo::{AssignmentChange, EmployeeRepository};
use crate::repo::time_record_repo::TimeRecordRepository;
use crate::repo::EntityKind;
use crate::service::distribution::TimesheetDistribution;
use crate::service::error::{AttributionError, AttributionResult};
use crate::service::hierarchy::{build_hierarchy, CompanyHierarchy, MonthPeriod};
use crate::service::validation::{self, HourPolicy, ValidationResult};
use crate::service::work_context::WorkContext;
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

/// Company picked by detection, with the rule that picked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedCompany {
    pub company: Company,
    pub rule: &'static str,
}

/// Persisted time record plus its advisory findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedTime {
    pub record: TimeRecord,
    pub validation: ValidationResult,
}

/// Attribution service facade over repository implementations.
pub struct AttributionService<C, E, T>
where
    C: CompanyRepository,
    E: EmployeeRepository,
    T: TimeRecordRepository,
{
    companies: C,
    employees: E,
    time_records: T,
    tenant_id: TenantId,
    config: AttributionConfig,
    detection: CompanyDetectionEngine,
}

impl<C, E, T> AttributionService<C, E, T>
where
    C: CompanyRepository,
    E: EmployeeRepository,
    T: TimeRecordRepository,
{
    /// Creates a tenant-scoped service with the standard detection rules.
    pub fn new(
        companies: C,
        employees: E,
        time_records: T,
        tenant_id: TenantId,
        config: AttributionConfig,
    ) -> Self {
        let detection = CompanyDetectionEngine::with_default_rules(&config);
        Self {
            companies,
            employees,
            time_records,
            tenant_id,
            config,
            detection,
        }
    }

    /// Replaces the detection rule chain.
    pub fn with_detection_engine(mut self, detection: CompanyDetectionEngine) -> Self {
        self.detection = detection;
        self
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Creates one company owned by this tenant.
    ///
    /// A project company's parent must be an employer of the same tenant.
    pub fn create_company(&self, company: &Company) -> AttributionResult<Company> {
        self.ensure_tenant(EntityKind::Company, company.id, company.tenant_id)?;
        company.validate()?;
        if let Some(parent_id) = company.parent_employer_id {
            let parent = self.load_company(parent_id)?;
            if !parent.is_employer() {
                return Err(AttributionError::ValidationFailed(format!(
                    "parent company {parent_id} is not an employer"
                )));
            }
        }

        let id = self.companies.create_company(company)?;
        let created = self.load_company(id)?;
        info!(
            "event=company_create module=service status=ok company_id={} type={}",
            created.id,
            created.kind.as_str()
        );
        Ok(created)
    }

    /// Builds an unsaved employee of this tenant with the configured default
    /// contract hours.
    pub fn new_employee(
        &self,
        display_name: impl Into<String>,
        primary_company_id: CompanyId,
    ) -> Employee {
        Employee::new(
            self.tenant_id,
            display_name,
            primary_company_id,
            self.config.default_contract_hours_per_week,
        )
    }

    /// Creates one employee of this tenant with its initial assignments.
    pub fn create_employee(&self, employee: &Employee) -> AttributionResult<Employee> {
        self.ensure_tenant(EntityKind::Employee, employee.id, employee.tenant_id)?;
        let primary = self.load_company(employee.primary_company_id)?;
        if !primary.is_employer() {
            return Err(AttributionError::ValidationFailed(format!(
                "primary company {} is not an employer",
                primary.id
            )));
        }
        let project_ids = dedup_ids(&employee.project_company_ids);
        self.check_project_companies(employee.id, primary.id, &project_ids)?;

        let mut employee = employee.clone();
        employee.project_company_ids = project_ids;
        employee.validate()?;
        let id = self.employees.create_employee(&employee)?;
        let created = self.load_employee(id)?;
        info!(
            "event=employee_create module=service status=ok employee_id={} project_count={}",
            created.id,
            created.project_company_ids.len()
        );
        Ok(created)
    }

    /// Lists this tenant's companies in creation order.
    pub fn list_companies(&self) -> AttributionResult<Vec<Company>> {
        Ok(self.companies.list_companies(self.tenant_id)?)
    }

    /// Returns the tenant's default employer, creating the configured seed
    /// employer when the tenant has none.
    pub fn ensure_default_employer(&self) -> AttributionResult<SeedOutcome> {
        let settings = &self.config.seed_employer;
        let seed = Company::employer(
            self.tenant_id,
            settings.name.as_str(),
            settings.registration_code.as_str(),
        );
        let outcome = self
            .companies
            .ensure_default_employer(&seed)
            .map_err(AttributionError::from)
            .inspect_err(|err| log_failure("employer_seed", err))?;
        info!(
            "event=employer_seed module=service status=ok company_id={} created={}",
            outcome.employer.id, outcome.created
        );
        Ok(outcome)
    }

    /// Builds the employer/project tree with statistics for `period`.
    ///
    /// Never seeds: a tenant without companies yields an empty tree.
    pub fn resolve_hierarchy(&self, period: MonthPeriod) -> AttributionResult<CompanyHierarchy> {
        let (from, to) = period.range().ok_or_else(|| {
            AttributionError::ValidationFailed(format!(
                "invalid month {}-{:02}",
                period.year, period.month
            ))
        })?;
        let companies = self.companies.list_companies(self.tenant_id)?;
        let employees = self.employees.list_employees(self.tenant_id)?;
        let hours = self
            .time_records
            .sum_hours_by_company(self.tenant_id, from, to)?;

        let hierarchy = build_hierarchy(self.tenant_id, period, &companies, &employees, &hours);
        if !hierarchy.orphan_projects.is_empty() {
            warn!(
                "event=hierarchy_resolve module=service status=orphans tenant_id={} orphan_count={}",
                self.tenant_id,
                hierarchy.orphan_projects.len()
            );
        }
        info!(
            "event=hierarchy_resolve module=service status=ok tenant_id={} employer_count={} company_count={}",
            self.tenant_id,
            hierarchy.employers.len(),
            companies.len()
        );
        Ok(hierarchy)
    }

    /// Resolves the companies `employee_id` may currently work for.
    pub fn resolve_work_context(&self, employee_id: EmployeeId) -> AttributionResult<WorkContext> {
        let employee = self
            .load_employee(employee_id)
            .inspect_err(|err| log_failure("work_context_resolve", err))?;
        let context = self.context_for(&employee)?;
        info!(
            "event=work_context_resolve module=service status=ok employee_id={} company_count={} requires_selection={}",
            employee_id,
            context.available_companies.len(),
            context.requires_selection
        );
        Ok(context)
    }

    /// Picks the company an activity of `employee_id` belongs to.
    pub fn detect_company(
        &self,
        employee_id: EmployeeId,
        hints: &DetectionHints,
    ) -> AttributionResult<DetectedCompany> {
        let context = self.resolve_work_context(employee_id)?;
        let outcome = self.detection.detect(&context, hints);
        info!(
            "event=company_detect module=service status=ok employee_id={} company_id={} rule={}",
            employee_id, outcome.company.id, outcome.rule
        );
        Ok(DetectedCompany {
            company: outcome.company.clone(),
            rule: outcome.rule,
        })
    }

    /// Aggregates one employee's ISO week by company.
    pub fn get_timesheet_distribution(
        &self,
        employee_id: EmployeeId,
        week: u32,
        year: i32,
    ) -> AttributionResult<TimesheetDistribution> {
        let range = week_dates(year, week).ok_or_else(|| {
            AttributionError::ValidationFailed(format!("invalid ISO week {year}-W{week:02}"))
        })?;
        let context = self.resolve_work_context(employee_id)?;
        let records = self
            .time_records
            .list_time_records(employee_id, range.start, range.end)?;

        let distribution = TimesheetDistribution::from_records(&context, year, week, range, &records);
        info!(
            "event=distribution_aggregate module=service status=ok employee_id={} year={} week={} record_count={} session_count={}",
            employee_id,
            year,
            week,
            records.len(),
            distribution.sessions.len()
        );
        Ok(distribution)
    }

    /// Checks a prospective record without persisting it.
    pub fn validate_time_record(&self, record: &TimeRecord) -> AttributionResult<ValidationResult> {
        record.validate()?;
        let employee = self.load_employee(record.employee_id)?;
        let context = self.context_for(&employee)?;
        let result = self.evaluate(&employee, &context, record)?;
        info!(
            "event=time_record_validate module=service status={} employee_id={} issue_count={} suggestion_count={}",
            if result.valid { "ok" } else { "rejected" },
            record.employee_id,
            result.issues.len(),
            result.suggestions.len()
        );
        Ok(result)
    }

    /// Attributes, validates and persists one time record.
    ///
    /// A record without a company is attributed through detection first.
    pub fn record_time(&self, mut record: TimeRecord) -> AttributionResult<RecordedTime> {
        record.validate()?;
        let employee = self.load_employee(record.employee_id)?;
        let context = self.context_for(&employee)?;

        if record.assigned_company_id.is_none() {
            let outcome = self.detection.detect(&context, &record.hints());
            record.assigned_company_id = Some(outcome.company.id);
            info!(
                "event=time_record_detect module=service status=ok record_id={} company_id={} rule={}",
                record.id, outcome.company.id, outcome.rule
            );
        }

        let validation = self.evaluate(&employee, &context, &record)?;
        if !validation.valid {
            let err = AttributionError::AccessDenied {
                employee_id: employee.id,
                company_id: record.effective_company_id(context.primary_company_id()),
            };
            log_failure("time_record_create", &err);
            return Err(err);
        }

        self.time_records.create_time_record(&record)?;
        info!(
            "event=time_record_create module=service status=ok record_id={} employee_id={} issue_count={}",
            record.id,
            employee.id,
            validation.issues.len()
        );
        Ok(RecordedTime { record, validation })
    }

    /// Replaces the employee's project companies.
    ///
    /// Ids are deduplicated in order. The list and its audit trail are
    /// written atomically; on failure nothing changes.
    pub fn assign_project_companies(
        &self,
        employee_id: EmployeeId,
        company_ids: &[CompanyId],
    ) -> AttributionResult<AssignmentChange> {
        let employee = self.load_employee(employee_id)?;
        let company_ids = dedup_ids(company_ids);
        self.check_project_companies(employee_id, employee.primary_company_id, &company_ids)
            .inspect_err(|err| log_failure("assignment_replace", err))?;

        let change = self
            .employees
            .replace_project_companies(employee_id, &company_ids)
            .map_err(AttributionError::from)
            .inspect_err(|err| log_failure("assignment_replace", err))?;
        info!(
            "event=assignment_replace module=service status=ok employee_id={} added={} removed={}",
            employee_id,
            change.added.len(),
            change.removed.len()
        );
        Ok(change)
    }

    /// Lists the assignment audit trail of one employee, oldest first.
    pub fn list_assignment_audit(
        &self,
        employee_id: EmployeeId,
    ) -> AttributionResult<Vec<AssignmentAuditEntry>> {
        self.load_employee(employee_id)?;
        Ok(self.employees.list_assignment_audit(employee_id)?)
    }

    fn evaluate(
        &self,
        employee: &Employee,
        context: &WorkContext,
        record: &TimeRecord,
    ) -> AttributionResult<ValidationResult> {
        let policy = HourPolicy {
            contract_hours_per_week: employee.contract_hours_per_week,
            ratio_limit: self.config.overtime_ratio_limit,
        };
        let access_ok = record
            .assigned_company_id
            .map_or(true, |company_id| context.contains(company_id));
        if !access_ok {
            return Ok(validation::evaluate(context, record, 0.0, policy));
        }
        if policy.limit().is_none() {
            info!(
                "event=time_record_validate module=service status=ratio_skipped employee_id={}",
                employee.id
            );
        }

        let (year, week) = iso_week(record.date);
        let range = week_dates(year, week).ok_or_else(|| {
            AttributionError::ValidationFailed(format!("invalid ISO week {year}-W{week:02}"))
        })?;
        let records = self
            .time_records
            .list_time_records(employee.id, range.start, range.end)?;
        let current = TimesheetDistribution::from_records(context, year, week, range, &records)
            .summary
            .total_hours;
        Ok(validation::evaluate(context, record, current, policy))
    }

    fn context_for(&self, employee: &Employee) -> AttributionResult<WorkContext> {
        let primary = self.load_company(employee.primary_company_id)?;

        let mut projects = Vec::with_capacity(employee.project_company_ids.len());
        for company_id in &employee.project_company_ids {
            match self.companies.get_company(*company_id)? {
                Some(company) if company.tenant_id == self.tenant_id && company.is_project() => {
                    projects.push(company)
                }
                _ => warn!(
                    "event=work_context_resolve module=service status=skipped employee_id={} company_id={}",
                    employee.id, company_id
                ),
            }
        }

        Ok(WorkContext::new(
            employee.id,
            primary,
            projects,
            self.config.hide_selector_when_possible,
        ))
    }

    fn check_project_companies(
        &self,
        employee_id: EmployeeId,
        primary_company_id: CompanyId,
        company_ids: &[CompanyId],
    ) -> AttributionResult<()> {
        for company_id in company_ids {
            let company = self
                .companies
                .get_company(*company_id)?
                .ok_or(AttributionError::NotFound {
                    kind: EntityKind::Company,
                    id: *company_id,
                })?;
            if company.tenant_id != self.tenant_id {
                return Err(AttributionError::AccessDenied {
                    employee_id,
                    company_id: *company_id,
                });
            }
            if *company_id == primary_company_id {
                return Err(AttributionError::ValidationFailed(format!(
                    "primary company {company_id} cannot also be a project company"
                )));
            }
            if !company.is_project() {
                return Err(AttributionError::ValidationFailed(format!(
                    "company {company_id} is not a project company"
                )));
            }
        }
        Ok(())
    }

    fn load_employee(&self, id: EmployeeId) -> AttributionResult<Employee> {
        let employee = self
            .employees
            .get_employee(id)?
            .ok_or(AttributionError::NotFound {
                kind: EntityKind::Employee,
                id,
            })?;
        self.ensure_tenant(EntityKind::Employee, id, employee.tenant_id)?;
        Ok(employee)
    }

    fn load_company(&self, id: CompanyId) -> AttributionResult<Company> {
        let company = self
            .companies
            .get_company(id)?
            .ok_or(AttributionError::NotFound {
                kind: EntityKind::Company,
                id,
            })?;
        self.ensure_tenant(EntityKind::Company, id, company.tenant_id)?;
        Ok(company)
    }

    fn ensure_tenant(
        &self,
        kind: EntityKind,
        id: Uuid,
        tenant_id: TenantId,
    ) -> AttributionResult<()> {
        if tenant_id == self.tenant_id {
            return Ok(());
        }
        let err = AttributionError::Unauthorized {
            kind,
            id,
            tenant_id: self.tenant_id,
        };
        log_failure("tenant_check", &err);
        Err(err)
    }
}

fn dedup_ids(ids: &[CompanyId]) -> Vec<CompanyId> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

fn log_failure(event: &str, err: &AttributionError) {
    warn!(
        "event={event} module=service status=error error_code={}",
        err.code()
    );
}
