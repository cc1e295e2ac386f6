//! Company domain model.
//!
//! # Responsibility
//! - Define employer and project company records.
//! - Enforce the employer/project parent invariant.
//!
//! # Invariants
//! - An employer never carries `parent_employer_id`.
//! - A project company always carries exactly one `parent_employer_id`.
//! - `name` is never blank.

use crate::model::TenantId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for companies.
pub type CompanyId = Uuid;

/// Legal role of a company inside one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    /// Entity that employs staff directly.
    Employer,
    /// Secondary entity linked to one employer; staff may log time against it.
    Project,
}

impl CompanyType {
    /// Stable storage/display string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Project => "project",
        }
    }

    /// Parses the storage string produced by [`CompanyType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "employer" => Some(Self::Employer),
            "project" => Some(Self::Project),
            _ => None,
        }
    }
}

/// Company record owned by one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Official registration code (organisation number).
    pub registration_code: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: CompanyType,
    /// Set iff `kind == CompanyType::Project`.
    pub parent_employer_id: Option<CompanyId>,
}

impl Company {
    /// Creates an employer company with a generated id.
    pub fn employer(
        tenant_id: TenantId,
        name: impl Into<String>,
        registration_code: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            registration_code: registration_code.into(),
            kind: CompanyType::Employer,
            parent_employer_id: None,
        }
    }

    /// Creates a project company under `parent_employer_id`.
    pub fn project(
        tenant_id: TenantId,
        parent_employer_id: CompanyId,
        name: impl Into<String>,
        registration_code: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            registration_code: registration_code.into(),
            kind: CompanyType::Project,
            parent_employer_id: Some(parent_employer_id),
        }
    }

    pub fn is_employer(&self) -> bool {
        self.kind == CompanyType::Employer
    }

    pub fn is_project(&self) -> bool {
        self.kind == CompanyType::Project
    }

    /// Validates model invariants.
    pub fn validate(&self) -> Result<(), CompanyValidationError> {
        if self.name.trim().is_empty() {
            return Err(CompanyValidationError::BlankName(self.id));
        }
        match (self.kind, self.parent_employer_id) {
            (CompanyType::Employer, Some(_)) => {
                Err(CompanyValidationError::EmployerWithParent(self.id))
            }
            (CompanyType::Project, None) => {
                Err(CompanyValidationError::ProjectWithoutParent(self.id))
            }
            (CompanyType::Project, Some(parent)) if parent == self.id => {
                Err(CompanyValidationError::SelfParent(self.id))
            }
            _ => Ok(()),
        }
    }
}

/// Company model invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyValidationError {
    BlankName(CompanyId),
    EmployerWithParent(CompanyId),
    ProjectWithoutParent(CompanyId),
    SelfParent(CompanyId),
}

impl Display for CompanyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(id) => write!(f, "company {id} has a blank name"),
            Self::EmployerWithParent(id) => {
                write!(f, "employer company {id} must not have a parent employer")
            }
            Self::ProjectWithoutParent(id) => {
                write!(f, "project company {id} requires a parent employer")
            }
            Self::SelfParent(id) => write!(f, "company {id} cannot be its own parent"),
        }
    }
}

impl Error for CompanyValidationError {}

#[cfg(test)]
mod tests {
    use super::{Company, CompanyType, CompanyValidationError};
    use uuid::Uuid;

    #[test]
    fn constructors_satisfy_parent_invariant() {
        let tenant = Uuid::new_v4();
        let employer = Company::employer(tenant, "Acme AB", "556000-0001");
        let project = Company::project(tenant, employer.id, "Acme Build", "556000-0002");

        assert!(employer.validate().is_ok());
        assert!(project.validate().is_ok());
        assert_eq!(project.parent_employer_id, Some(employer.id));
    }

    #[test]
    fn employer_with_parent_is_rejected() {
        let tenant = Uuid::new_v4();
        let mut employer = Company::employer(tenant, "Acme AB", "1");
        employer.parent_employer_id = Some(Uuid::new_v4());
        assert!(matches!(
            employer.validate(),
            Err(CompanyValidationError::EmployerWithParent(_))
        ));
    }

    #[test]
    fn project_without_parent_is_rejected() {
        let tenant = Uuid::new_v4();
        let mut project = Company::project(tenant, Uuid::new_v4(), "Side", "2");
        project.parent_employer_id = None;
        assert!(matches!(
            project.validate(),
            Err(CompanyValidationError::ProjectWithoutParent(_))
        ));
    }

    #[test]
    fn company_type_parse_matches_as_str() {
        for kind in [CompanyType::Employer, CompanyType::Project] {
            assert_eq!(CompanyType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CompanyType::parse("holding"), None);
    }
}
