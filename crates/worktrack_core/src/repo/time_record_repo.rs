//! Time record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist time records and serve bounded date-range reads.
//! - Aggregate attributed hours per company for hierarchy statistics.
//!
//! # Invariants
//! - Date ranges are inclusive on both ends.
//! - Range listing is deterministic: `work_date, created_at, rowid`.
//! - Untagged records aggregate to the employee's primary company.

use crate::db::ensure_schema_ready;
use crate::model::company::CompanyId;
use crate::model::employee::EmployeeId;
use crate::model::time_record::{TimeRecord, TimeRecordId};
use crate::model::TenantId;
use crate::repo::{date_to_db, parse_date, parse_uuid, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const TIME_RECORD_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    work_date,
    regular_hours,
    overtime_hours,
    assigned_company_id,
    project_code,
    client_id,
    import_source
FROM time_records";

/// Repository interface for time record storage.
pub trait TimeRecordRepository {
    fn create_time_record(&self, record: &TimeRecord) -> RepoResult<TimeRecordId>;
    /// Lists one employee's records with `from <= date <= to`.
    fn list_time_records(
        &self,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<TimeRecord>>;
    /// Sums `regular + overtime` per effective company across a tenant's
    /// employees with `from <= date <= to`.
    fn sum_hours_by_company(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<(CompanyId, f64)>>;
}

/// SQLite-backed time record repository.
pub struct SqliteTimeRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTimeRecordRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TimeRecordRepository for SqliteTimeRecordRepository<'_> {
    fn create_time_record(&self, record: &TimeRecord) -> RepoResult<TimeRecordId> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO time_records (
                id,
                employee_id,
                work_date,
                regular_hours,
                overtime_hours,
                assigned_company_id,
                project_code,
                client_id,
                import_source
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                record.id.to_string(),
                record.employee_id.to_string(),
                date_to_db(record.date),
                record.regular_hours,
                record.overtime_hours,
                record.assigned_company_id.map(|value| value.to_string()),
                record.project_code.as_deref(),
                record.client_id.as_deref(),
                record.import_source.as_deref(),
            ],
        )?;

        Ok(record.id)
    }

    fn list_time_records(
        &self,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<TimeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TIME_RECORD_SELECT_SQL}
             WHERE employee_id = ?1
               AND work_date >= ?2
               AND work_date <= ?3
             ORDER BY work_date ASC, created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            employee_id.to_string(),
            date_to_db(from),
            date_to_db(to),
        ])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_time_record_row(row)?);
        }
        Ok(records)
    }

    fn sum_hours_by_company(
        &self,
        tenant_id: TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<(CompanyId, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                COALESCE(t.assigned_company_id, e.primary_company_id) AS company_id,
                SUM(t.regular_hours + t.overtime_hours) AS total_hours
             FROM time_records t
             INNER JOIN employees e ON e.id = t.employee_id
             WHERE e.tenant_id = ?1
               AND t.work_date >= ?2
               AND t.work_date <= ?3
             GROUP BY company_id
             ORDER BY company_id ASC;",
        )?;
        let mut rows = stmt.query(params![
            tenant_id.to_string(),
            date_to_db(from),
            date_to_db(to),
        ])?;
        let mut totals = Vec::new();
        while let Some(row) = rows.next()? {
            let company_id: String = row.get("company_id")?;
            totals.push((
                parse_uuid(&company_id, "time_records.assigned_company_id")?,
                row.get::<_, f64>("total_hours")?,
            ));
        }
        Ok(totals)
    }
}

fn parse_time_record_row(row: &Row<'_>) -> RepoResult<TimeRecord> {
    let record = TimeRecord {
        id: parse_uuid(&row.get::<_, String>("id")?, "time_records.id")?,
        employee_id: parse_uuid(
            &row.get::<_, String>("employee_id")?,
            "time_records.employee_id",
        )?,
        date: parse_date(&row.get::<_, String>("work_date")?, "time_records.work_date")?,
        regular_hours: row.get("regular_hours")?,
        overtime_hours: row.get("overtime_hours")?,
        assigned_company_id: row
            .get::<_, Option<String>>("assigned_company_id")?
            .map(|value| parse_uuid(&value, "time_records.assigned_company_id"))
            .transpose()?,
        project_code: row.get("project_code")?,
        client_id: row.get("client_id")?,
        import_source: row.get("import_source")?,
    };
    record.validate()?;
    Ok(record)
}
