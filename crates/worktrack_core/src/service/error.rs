//! Hard failures raised by attribution use-cases.
//!
//! Four classes reach callers: `NotFound`, `AccessDenied`,
//! `ValidationFailed` and `Unauthorized`. Storage failures, including
//! stored rows that no longer validate, are wrapped in `Repo`. Nothing here is retried internally.

use crate::model::company::{CompanyId, CompanyValidationError};
use crate::model::employee::{EmployeeId, EmployeeValidationError};
use crate::model::time_record::TimeRecordValidationError;
use crate::model::TenantId;
use crate::repo::{EntityKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AttributionResult<T> = Result<T, AttributionError>;

/// Attribution use-case error.
#[derive(Debug)]
pub enum AttributionError {
    /// Employee or referenced company is missing.
    NotFound { kind: EntityKind, id: Uuid },
    /// Target company is outside the employee's available set or tenant.
    AccessDenied {
        employee_id: EmployeeId,
        company_id: CompanyId,
    },
    /// Malformed input.
    ValidationFailed(String),
    /// Entity belongs to another tenant than the service handle.
    Unauthorized {
        kind: EntityKind,
        id: Uuid,
        tenant_id: TenantId,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl AttributionError {
    /// Stable error code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AccessDenied { .. } => "access_denied",
            Self::ValidationFailed(_) => "validation_failed",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for AttributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::AccessDenied {
                employee_id,
                company_id,
            } => write!(
                f,
                "access denied: company {company_id} is not available to employee {employee_id}"
            ),
            Self::ValidationFailed(message) => write!(f, "validation failed: {message}"),
            Self::Unauthorized {
                kind,
                id,
                tenant_id,
            } => write!(
                f,
                "unauthorized: {} {id} does not belong to tenant {tenant_id}",
                kind.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AttributionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AttributionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl From<TimeRecordValidationError> for AttributionError {
    fn from(value: TimeRecordValidationError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}

impl From<CompanyValidationError> for AttributionError {
    fn from(value: CompanyValidationError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}

impl From<EmployeeValidationError> for AttributionError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}
