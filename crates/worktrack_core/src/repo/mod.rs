//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate model invariants before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-row mutations run in one `IMMEDIATE` transaction.

pub mod company_repo;
pub mod employee_repo;
pub mod time_record_repo;

use crate::db::DbError;
use crate::model::company::CompanyValidationError;
use crate::model::employee::EmployeeValidationError;
use crate::model::time_record::TimeRecordValidationError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kinds addressed by repository lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Employee,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Employee => "employee",
        }
    }
}

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: EntityKind, id: Uuid },
    InvalidCompany(CompanyValidationError),
    InvalidEmployee(EmployeeValidationError),
    InvalidTimeRecord(TimeRecordValidationError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::InvalidCompany(err) => write!(f, "{err}"),
            Self::InvalidEmployee(err) => write!(f, "{err}"),
            Self::InvalidTimeRecord(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidCompany(err) => Some(err),
            Self::InvalidEmployee(err) => Some(err),
            Self::InvalidTimeRecord(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CompanyValidationError> for RepoError {
    fn from(value: CompanyValidationError) -> Self {
        Self::InvalidCompany(value)
    }
}

impl From<EmployeeValidationError> for RepoError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::InvalidEmployee(value)
    }
}

impl From<TimeRecordValidationError> for RepoError {
    fn from(value: TimeRecordValidationError) -> Self {
        Self::InvalidTimeRecord(value)
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
