//! Employee domain model.
//!
//! # Responsibility
//! - Define the employee record and its company links.
//!
//! # Invariants
//! - `primary_company_id` never appears in `project_company_ids`.
//! - `project_company_ids` holds no duplicates; order is assignment order.
//! - `contract_hours_per_week` is finite and non-negative.

use crate::model::company::CompanyId;
use crate::model::TenantId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for employees.
pub type EmployeeId = Uuid;

/// Employee record owned by one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub tenant_id: TenantId,
    pub display_name: String,
    /// Employer the employee is directly contracted to.
    pub primary_company_id: CompanyId,
    /// Project companies the employee may log time against.
    pub project_company_ids: Vec<CompanyId>,
    pub contract_hours_per_week: f64,
}

impl Employee {
    /// Creates an employee with no project assignments.
    pub fn new(
        tenant_id: TenantId,
        display_name: impl Into<String>,
        primary_company_id: CompanyId,
        contract_hours_per_week: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            display_name: display_name.into(),
            primary_company_id,
            project_company_ids: Vec::new(),
            contract_hours_per_week,
        }
    }

    /// Validates model invariants.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        if !self.contract_hours_per_week.is_finite() || self.contract_hours_per_week < 0.0 {
            return Err(EmployeeValidationError::InvalidContractHours(
                self.contract_hours_per_week,
            ));
        }
        if self.project_company_ids.contains(&self.primary_company_id) {
            return Err(EmployeeValidationError::PrimaryListedAsProject(
                self.primary_company_id,
            ));
        }
        for (index, id) in self.project_company_ids.iter().enumerate() {
            if self.project_company_ids[..index].contains(id) {
                return Err(EmployeeValidationError::DuplicateProjectCompany(*id));
            }
        }
        Ok(())
    }
}

/// Employee model invariant violations.
#[derive(Debug, Clone, PartialEq)]
pub enum EmployeeValidationError {
    InvalidContractHours(f64),
    PrimaryListedAsProject(CompanyId),
    DuplicateProjectCompany(CompanyId),
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContractHours(hours) => {
                write!(f, "contract hours per week must be finite and >= 0, got {hours}")
            }
            Self::PrimaryListedAsProject(id) => {
                write!(f, "primary company {id} cannot also be a project company")
            }
            Self::DuplicateProjectCompany(id) => {
                write!(f, "project company {id} is listed more than once")
            }
        }
    }
}

impl Error for EmployeeValidationError {}
