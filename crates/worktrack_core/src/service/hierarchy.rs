//! Employer/project company tree with per-node statistics.
//!
//! # Invariants
//! - Employers appear in company listing order; each employer's projects
//!   keep listing order too.
//! - Projects whose parent employer is absent are kept in `orphan_projects`.
//! - `hours_in_period` uses effective attribution: untagged records count
//!   for the employee's primary company.

use crate::model::company::{Company, CompanyId};
use crate::model::employee::Employee;
use crate::model::TenantId;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Calendar month used as the statistics window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    /// Returns `None` for months outside 1..=12 or unsupported years.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// First and last day of the month, inclusive.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        }?;
        Some((start, next.pred_opt()?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub employee_count: usize,
    pub hours_in_period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectNode {
    pub company: Company,
    pub stats: CompanyStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerNode {
    pub employer: Company,
    pub projects: Vec<ProjectNode>,
    pub stats: CompanyStats,
}

impl EmployerNode {
    /// Hours of the employer plus all of its projects.
    pub fn group_hours(&self) -> f64 {
        self.stats.hours_in_period
            + self
                .projects
                .iter()
                .map(|project| project.stats.hours_in_period)
                .sum::<f64>()
    }
}

/// Company tree of one tenant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHierarchy {
    pub tenant_id: TenantId,
    /// `None` only when the tenant has no employer.
    pub default_employer_id: Option<CompanyId>,
    pub employers: Vec<EmployerNode>,
    pub orphan_projects: Vec<ProjectNode>,
    pub period: MonthPeriod,
}

impl CompanyHierarchy {
    pub fn employer(&self, id: CompanyId) -> Option<&EmployerNode> {
        self.employers.iter().find(|node| node.employer.id == id)
    }
}

/// Assembles the tree from already-loaded tenant state.
///
/// `companies` must be in listing order (oldest first); the first employer
/// becomes the default employer.
pub fn build_hierarchy(
    tenant_id: TenantId,
    period: MonthPeriod,
    companies: &[Company],
    employees: &[Employee],
    hours_by_company: &[(CompanyId, f64)],
) -> CompanyHierarchy {
    let hours: HashMap<CompanyId, f64> = hours_by_company.iter().copied().collect();
    let stats_for = |company_id: CompanyId| CompanyStats {
        employee_count: employees
            .iter()
            .filter(|employee| {
                employee.primary_company_id == company_id
                    || employee.project_company_ids.contains(&company_id)
            })
            .count(),
        hours_in_period: hours.get(&company_id).copied().unwrap_or(0.0),
    };

    let mut employers: Vec<EmployerNode> = companies
        .iter()
        .filter(|company| company.is_employer())
        .map(|employer| EmployerNode {
            employer: employer.clone(),
            projects: Vec::new(),
            stats: stats_for(employer.id),
        })
        .collect();

    let mut orphan_projects = Vec::new();
    for project in companies.iter().filter(|company| company.is_project()) {
        let node = ProjectNode {
            company: project.clone(),
            stats: stats_for(project.id),
        };
        match employers
            .iter_mut()
            .find(|parent| Some(parent.employer.id) == project.parent_employer_id)
        {
            Some(parent) => parent.projects.push(node),
            None => orphan_projects.push(node),
        }
    }

    CompanyHierarchy {
        tenant_id,
        default_employer_id: employers.first().map(|node| node.employer.id),
        employers,
        orphan_projects,
        period,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_hierarchy, MonthPeriod};
    use crate::model::company::Company;
    use crate::model::employee::Employee;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn month_range_covers_leap_february_and_december() {
        let feb = MonthPeriod::new(2024, 2).unwrap().range().unwrap();
        assert_eq!(feb.0, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.1, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec = MonthPeriod::new(2023, 12).unwrap().range().unwrap();
        assert_eq!(dec.1, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(MonthPeriod::new(2024, 13).is_none());
        assert!(MonthPeriod::new(2024, 0).is_none());
    }

    #[test]
    fn builds_tree_with_counts_hours_and_orphans() {
        let tenant = Uuid::new_v4();
        let main = Company::employer(tenant, "Main", "1");
        let second = Company::employer(tenant, "Second", "2");
        let project = Company::project(tenant, main.id, "Project", "3");
        let orphan = Company::project(tenant, Uuid::new_v4(), "Orphan", "4");

        let mut alice = Employee::new(tenant, "Alice", main.id, 40.0);
        alice.project_company_ids = vec![project.id];
        let bob = Employee::new(tenant, "Bob", main.id, 40.0);
        let carol = Employee::new(tenant, "Carol", second.id, 30.0);

        let hierarchy = build_hierarchy(
            tenant,
            MonthPeriod::new(2024, 3).unwrap(),
            &[main.clone(), project.clone(), second.clone(), orphan.clone()],
            &[alice, bob, carol],
            &[(main.id, 120.0), (project.id, 16.5), (orphan.id, 2.0)],
        );

        assert_eq!(hierarchy.default_employer_id, Some(main.id));
        assert_eq!(hierarchy.employers.len(), 2);

        let main_node = hierarchy.employer(main.id).unwrap();
        assert_eq!(main_node.stats.employee_count, 2);
        assert_eq!(main_node.stats.hours_in_period, 120.0);
        assert_eq!(main_node.projects.len(), 1);
        assert_eq!(main_node.projects[0].stats.employee_count, 1);
        assert_eq!(main_node.group_hours(), 136.5);

        let second_node = hierarchy.employer(second.id).unwrap();
        assert_eq!(second_node.stats.employee_count, 1);
        assert_eq!(second_node.stats.hours_in_period, 0.0);

        assert_eq!(hierarchy.orphan_projects.len(), 1);
        assert_eq!(hierarchy.orphan_projects[0].company.id, orphan.id);
    }

    #[test]
    fn empty_tenant_yields_empty_hierarchy() {
        let hierarchy = build_hierarchy(
            Uuid::new_v4(),
            MonthPeriod::new(2024, 1).unwrap(),
            &[],
            &[],
            &[],
        );
        assert!(hierarchy.default_employer_id.is_none());
        assert!(hierarchy.employers.is_empty());
        assert!(hierarchy.orphan_projects.is_empty());
    }
}
