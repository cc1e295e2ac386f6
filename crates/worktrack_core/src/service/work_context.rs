//! Work context: the companies one employee may currently work for.
//!
//! # Invariants
//! - `available_companies[0]` is the primary company.
//! - `available_companies` holds no duplicate ids.
//! - Flags are derived from `available_companies` at construction and never
//!   updated afterwards; contexts are rebuilt per request.

use crate::model::company::{Company, CompanyId};
use crate::model::employee::EmployeeId;
use crate::model::TenantId;
use serde::Serialize;

/// Derived view of the companies available to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkContext {
    pub employee_id: EmployeeId,
    pub tenant_id: TenantId,
    pub primary_company: Company,
    /// Primary first, then project companies in assignment order.
    pub available_companies: Vec<Company>,
    /// More than one company is available.
    pub can_switch: bool,
    /// Callers must offer an explicit company choice.
    pub requires_selection: bool,
    /// At least one project company is available.
    pub has_multiple_assignments: bool,
}

impl WorkContext {
    /// Builds a context from the primary company and resolved project
    /// companies. Duplicates, including the primary, are dropped.
    pub fn new(
        employee_id: EmployeeId,
        primary_company: Company,
        project_companies: Vec<Company>,
        hide_selector_when_possible: bool,
    ) -> Self {
        let mut available_companies = vec![primary_company.clone()];
        for company in project_companies {
            if available_companies
                .iter()
                .all(|existing| existing.id != company.id)
            {
                available_companies.push(company);
            }
        }

        let can_switch = available_companies.len() > 1;
        Self {
            employee_id,
            tenant_id: primary_company.tenant_id,
            primary_company,
            has_multiple_assignments: available_companies.len() > 1,
            requires_selection: !hide_selector_when_possible || can_switch,
            can_switch,
            available_companies,
        }
    }

    pub fn primary_company_id(&self) -> CompanyId {
        self.primary_company.id
    }

    /// Returns the available company with `id`.
    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.available_companies
            .iter()
            .find(|company| company.id == id)
    }

    /// Returns whether `id` is one of the available companies.
    pub fn contains(&self, id: CompanyId) -> bool {
        self.company(id).is_some()
    }

    /// Available company ids in context order.
    pub fn available_company_ids(&self) -> Vec<CompanyId> {
        self.available_companies
            .iter()
            .map(|company| company.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::WorkContext;
    use crate::model::company::Company;
    use uuid::Uuid;

    #[test]
    fn available_companies_deduplicate_and_keep_primary_first() {
        let tenant = Uuid::new_v4();
        let primary = Company::employer(tenant, "Primary AB", "1");
        let project = Company::project(tenant, primary.id, "Project AB", "2");

        let context = WorkContext::new(
            Uuid::new_v4(),
            primary.clone(),
            vec![project.clone(), primary.clone(), project.clone()],
            true,
        );

        assert_eq!(context.available_company_ids(), vec![primary.id, project.id]);
        assert!(context.can_switch);
        assert!(context.requires_selection);
        assert!(context.has_multiple_assignments);
    }

    #[test]
    fn single_company_context_hides_selector_when_configured() {
        let tenant = Uuid::new_v4();
        let primary = Company::employer(tenant, "Primary AB", "1");

        let hidden = WorkContext::new(Uuid::new_v4(), primary.clone(), Vec::new(), true);
        assert!(!hidden.can_switch);
        assert!(!hidden.requires_selection);
        assert!(!hidden.has_multiple_assignments);

        let shown = WorkContext::new(Uuid::new_v4(), primary, Vec::new(), false);
        assert!(shown.requires_selection);
        assert!(!shown.can_switch);
    }

    #[test]
    fn available_set_is_independent_of_project_order() {
        let tenant = Uuid::new_v4();
        let primary = Company::employer(tenant, "Primary AB", "1");
        let b = Company::project(tenant, primary.id, "B", "2");
        let c = Company::project(tenant, primary.id, "C", "3");

        let forward = WorkContext::new(
            Uuid::new_v4(),
            primary.clone(),
            vec![b.clone(), c.clone()],
            true,
        );
        let backward = WorkContext::new(Uuid::new_v4(), primary, vec![c, b], true);

        let mut forward_ids = forward.available_company_ids();
        let mut backward_ids = backward.available_company_ids();
        forward_ids.sort();
        backward_ids.sort();
        assert_eq!(forward_ids, backward_ids);
        assert_eq!(forward_ids.len(), 3);
    }
}
