//! Employee repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist employees and their ordered project-company links.
//! - Replace project-company links and write the matching audit trail as
//!   one atomic group.
//!
//! # Invariants
//! - `Employee::validate()` runs before every write and after every read.
//! - Link replacement and audit rows commit together or not at all.
//! - Project links are returned in `position ASC` order.

use crate::db::ensure_schema_ready;
use crate::model::assignment_audit::{AssignmentAction, AssignmentAuditEntry};
use crate::model::company::CompanyId;
use crate::model::employee::{Employee, EmployeeId};
use crate::model::TenantId;
use crate::repo::{parse_uuid, EntityKind, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    display_name,
    primary_company_id,
    contract_hours_per_week
FROM employees";

/// Net effect of one project-company replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentChange {
    /// Companies newly linked, in requested order.
    pub added: Vec<CompanyId>,
    /// Companies no longer linked, in previous order.
    pub removed: Vec<CompanyId>,
}

impl AssignmentChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Repository interface for employee storage.
pub trait EmployeeRepository {
    /// Inserts the employee, its project links and their `assigned` audit
    /// entries in one transaction.
    fn create_employee(&self, employee: &Employee) -> RepoResult<EmployeeId>;
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn list_employees(&self, tenant_id: TenantId) -> RepoResult<Vec<Employee>>;
    /// Replaces the employee's project links with `company_ids` and appends
    /// one audit entry per added or removed company.
    fn replace_project_companies(
        &self,
        employee_id: EmployeeId,
        company_ids: &[CompanyId],
    ) -> RepoResult<AssignmentChange>;
    /// Lists audit entries for one employee, oldest first.
    fn list_assignment_audit(
        &self,
        employee_id: EmployeeId,
    ) -> RepoResult<Vec<AssignmentAuditEntry>>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &Employee) -> RepoResult<EmployeeId> {
        employee.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO employees (
                id,
                tenant_id,
                display_name,
                primary_company_id,
                contract_hours_per_week
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                employee.id.to_string(),
                employee.tenant_id.to_string(),
                employee.display_name.as_str(),
                employee.primary_company_id.to_string(),
                employee.contract_hours_per_week,
            ],
        )?;
        insert_project_links(&tx, employee.id, &employee.project_company_ids)?;
        for company_id in &employee.project_company_ids {
            insert_audit_entry(&tx, employee.id, *company_id, AssignmentAction::Assigned)?;
        }
        tx.commit()?;

        Ok(employee.id)
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(load_employee(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_employees(&self, tenant_id: TenantId) -> RepoResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYEE_SELECT_SQL}
             WHERE tenant_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([tenant_id.to_string()])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(load_employee(self.conn, row)?);
        }
        Ok(employees)
    }

    fn replace_project_companies(
        &self,
        employee_id: EmployeeId,
        company_ids: &[CompanyId],
    ) -> RepoResult<AssignmentChange> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut employee = {
            let mut stmt = tx.prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([employee_id.to_string()])?;
            match rows.next()? {
                Some(row) => load_employee(&tx, row)?,
                None => {
                    return Err(RepoError::NotFound {
                        kind: EntityKind::Employee,
                        id: employee_id,
                    })
                }
            }
        };

        let previous = std::mem::replace(&mut employee.project_company_ids, company_ids.to_vec());
        employee.validate()?;

        let change = AssignmentChange {
            added: company_ids
                .iter()
                .filter(|id| !previous.contains(*id))
                .copied()
                .collect(),
            removed: previous
                .iter()
                .filter(|id| !company_ids.contains(*id))
                .copied()
                .collect(),
        };

        tx.execute(
            "DELETE FROM employee_project_companies WHERE employee_id = ?1;",
            [employee_id.to_string()],
        )?;
        insert_project_links(&tx, employee_id, company_ids)?;

        for (action, ids) in [
            (AssignmentAction::Assigned, &change.added),
            (AssignmentAction::Unassigned, &change.removed),
        ] {
            for company_id in ids {
                insert_audit_entry(&tx, employee_id, *company_id, action)?;
            }
        }

        tx.execute(
            "UPDATE employees
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [employee_id.to_string()],
        )?;

        tx.commit()?;
        Ok(change)
    }

    fn list_assignment_audit(
        &self,
        employee_id: EmployeeId,
    ) -> RepoResult<Vec<AssignmentAuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, employee_id, company_id, action, recorded_at
             FROM assignment_audit
             WHERE employee_id = ?1
             ORDER BY recorded_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([employee_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_audit_row(row)?);
        }
        Ok(entries)
    }
}

fn insert_project_links(
    conn: &Connection,
    employee_id: EmployeeId,
    company_ids: &[CompanyId],
) -> RepoResult<()> {
    for (position, company_id) in company_ids.iter().enumerate() {
        conn.execute(
            "INSERT INTO employee_project_companies (employee_id, company_id, position)
             VALUES (?1, ?2, ?3);",
            params![
                employee_id.to_string(),
                company_id.to_string(),
                position as i64,
            ],
        )?;
    }
    Ok(())
}

fn insert_audit_entry(
    conn: &Connection,
    employee_id: EmployeeId,
    company_id: CompanyId,
    action: AssignmentAction,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO assignment_audit (id, employee_id, company_id, action)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            Uuid::new_v4().to_string(),
            employee_id.to_string(),
            company_id.to_string(),
            action.as_str(),
        ],
    )?;
    Ok(())
}

fn load_employee(conn: &Connection, row: &Row<'_>) -> RepoResult<Employee> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "employees.id")?;
    let employee = Employee {
        id,
        tenant_id: parse_uuid(&row.get::<_, String>("tenant_id")?, "employees.tenant_id")?,
        display_name: row.get("display_name")?,
        primary_company_id: parse_uuid(
            &row.get::<_, String>("primary_company_id")?,
            "employees.primary_company_id",
        )?,
        project_company_ids: list_project_links(conn, id)?,
        contract_hours_per_week: row.get("contract_hours_per_week")?,
    };
    employee.validate()?;
    Ok(employee)
}

fn list_project_links(conn: &Connection, employee_id: EmployeeId) -> RepoResult<Vec<CompanyId>> {
    let mut stmt = conn.prepare(
        "SELECT company_id
         FROM employee_project_companies
         WHERE employee_id = ?1
         ORDER BY position ASC, company_id ASC;",
    )?;
    let mut rows = stmt.query([employee_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "employee_project_companies.company_id")?);
    }
    Ok(ids)
}

fn parse_audit_row(row: &Row<'_>) -> RepoResult<AssignmentAuditEntry> {
    let action_text: String = row.get("action")?;
    let action = AssignmentAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid assignment action `{action_text}` in assignment_audit.action"
        ))
    })?;
    Ok(AssignmentAuditEntry {
        id: parse_uuid(&row.get::<_, String>("id")?, "assignment_audit.id")?,
        employee_id: parse_uuid(
            &row.get::<_, String>("employee_id")?,
            "assignment_audit.employee_id",
        )?,
        company_id: parse_uuid(
            &row.get::<_, String>("company_id")?,
            "assignment_audit.company_id",
        )?,
        action,
        recorded_at: row.get("recorded_at")?,
    })
}
