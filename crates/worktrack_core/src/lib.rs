//! Core domain logic for multi-company work attribution.
//! This crate is the single source of truth for attribution invariants.

pub mod calendar;
pub mod config;
pub mod db;
pub mod detection;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::iso_week::{iso_week, week_dates, week_number, WeekRange};
pub use config::{load_config, AttributionConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use detection::{CompanyDetectionEngine, DetectionError, DetectionOutcome};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::company::{Company, CompanyId, CompanyType};
pub use model::employee::{Employee, EmployeeId};
pub use model::time_record::{DetectionHints, TimeRecord, TimeRecordId};
pub use model::TenantId;
pub use repo::company_repo::{CompanyRepository, SqliteCompanyRepository};
pub use repo::employee_repo::{EmployeeRepository, SqliteEmployeeRepository};
pub use repo::time_record_repo::{SqliteTimeRecordRepository, TimeRecordRepository};
pub use repo::{RepoError, RepoResult};
pub use service::attribution_service::{AttributionService, DetectedCompany, RecordedTime};
pub use service::error::{AttributionError, AttributionResult};
pub use service::hierarchy::{CompanyHierarchy, MonthPeriod};
pub use service::validation::ValidationResult;
pub use service::work_context::WorkContext;

/// SQLite-backed attribution service borrowing one connection.
pub type SqliteAttributionService<'conn> = AttributionService<
    SqliteCompanyRepository<'conn>,
    SqliteEmployeeRepository<'conn>,
    SqliteTimeRecordRepository<'conn>,
>;

/// Builds a tenant-scoped service over one migrated connection.
pub fn sqlite_service(
    conn: &rusqlite::Connection,
    tenant_id: TenantId,
    config: AttributionConfig,
) -> RepoResult<SqliteAttributionService<'_>> {
    Ok(AttributionService::new(
        SqliteCompanyRepository::try_new(conn)?,
        SqliteEmployeeRepository::try_new(conn)?,
        SqliteTimeRecordRepository::try_new(conn)?,
        tenant_id,
        config,
    ))
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
