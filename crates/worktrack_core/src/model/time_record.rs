//! Time record domain model and detection hints.
//!
//! # Responsibility
//! - Define one unit of worked time and its optional attribution metadata.
//! - Derive detection hints from record metadata.
//!
//! # Invariants
//! - `regular_hours` and `overtime_hours` are finite and non-negative.
//! - A record without `assigned_company_id` belongs to the employee's
//!   primary company.

use crate::model::company::CompanyId;
use crate::model::employee::EmployeeId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for time records.
pub type TimeRecordId = Uuid;

/// One unit of worked time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub id: TimeRecordId,
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub assigned_company_id: Option<CompanyId>,
    /// Free-text project code as typed or imported.
    pub project_code: Option<String>,
    pub client_id: Option<String>,
    /// Name of the external system the record was imported from.
    pub import_source: Option<String>,
}

impl TimeRecord {
    /// Creates an untagged record with a generated id.
    pub fn new(employee_id: EmployeeId, date: NaiveDate, regular_hours: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            date,
            regular_hours,
            overtime_hours: 0.0,
            assigned_company_id: None,
            project_code: None,
            client_id: None,
            import_source: None,
        }
    }

    /// Regular plus overtime hours.
    pub fn total_hours(&self) -> f64 {
        self.regular_hours + self.overtime_hours
    }

    /// Company the record counts towards, falling back to `primary`.
    pub fn effective_company_id(&self, primary: CompanyId) -> CompanyId {
        self.assigned_company_id.unwrap_or(primary)
    }

    /// Returns detection hints carried by this record.
    pub fn hints(&self) -> DetectionHints {
        DetectionHints {
            company_id: self.assigned_company_id,
            import_source: self.import_source.clone(),
            project_code: self.project_code.clone(),
            client_id: self.client_id.clone(),
        }
    }

    /// Validates model invariants.
    pub fn validate(&self) -> Result<(), TimeRecordValidationError> {
        for (field, value) in [
            ("regular_hours", self.regular_hours),
            ("overtime_hours", self.overtime_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TimeRecordValidationError::InvalidHours { field, value });
            }
        }
        Ok(())
    }
}

/// Time record invariant violations.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeRecordValidationError {
    InvalidHours { field: &'static str, value: f64 },
}

impl Display for TimeRecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHours { field, value } => {
                write!(f, "`{field}` must be finite and >= 0, got {value}")
            }
        }
    }
}

impl Error for TimeRecordValidationError {}

/// Optional metadata used to infer the owning company of an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionHints {
    /// Explicitly requested company.
    pub company_id: Option<CompanyId>,
    /// External system tag, e.g. `fortnox`.
    pub import_source: Option<String>,
    pub project_code: Option<String>,
    pub client_id: Option<String>,
}

impl DetectionHints {
    /// Import source, `None` when absent or blank.
    pub fn import_source(&self) -> Option<&str> {
        non_blank(self.import_source.as_deref())
    }

    /// Project code, `None` when absent or blank.
    pub fn project_code(&self) -> Option<&str> {
        non_blank(self.project_code.as_deref())
    }

    /// Client identifier, `None` when absent or blank.
    pub fn client_id(&self) -> Option<&str> {
        non_blank(self.client_id.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
