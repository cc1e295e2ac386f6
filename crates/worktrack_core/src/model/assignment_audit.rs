//! Audit trail entries for project-company assignment changes.

use crate::model::company::CompanyId;
use crate::model::employee::EmployeeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of one assignment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentAction {
    Assigned,
    Unassigned,
}

impl AssignmentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assigned" => Some(Self::Assigned),
            "unassigned" => Some(Self::Unassigned),
            _ => None,
        }
    }
}

/// One persisted assignment change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentAuditEntry {
    pub id: Uuid,
    pub employee_id: EmployeeId,
    pub company_id: CompanyId,
    pub action: AssignmentAction,
    /// Epoch milliseconds.
    pub recorded_at: i64,
}
