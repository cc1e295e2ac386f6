//! Company repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist employer/project companies per tenant.
//! - Provide the idempotent default-employer seed as one atomic
//!   read-modify-write.
//!
//! # Invariants
//! - Company listing is deterministic: insertion order (`created_at, rowid`).
//! - At most one seed employer is ever inserted per tenant.

use crate::db::ensure_schema_ready;
use crate::model::company::{Company, CompanyId, CompanyType};
use crate::model::TenantId;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const COMPANY_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    name,
    registration_code,
    type,
    parent_employer_id
FROM companies";

/// Result of the default-employer seed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Default employer of the tenant after the call.
    pub employer: Company,
    /// Whether this call inserted `employer`.
    pub created: bool,
}

/// Repository interface for company storage.
pub trait CompanyRepository {
    fn create_company(&self, company: &Company) -> RepoResult<CompanyId>;
    fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>>;
    /// Lists all companies of one tenant.
    fn list_companies(&self, tenant_id: TenantId) -> RepoResult<Vec<Company>>;
    /// Returns the oldest employer of the tenant, inserting `seed` when the
    /// tenant has none.
    fn ensure_default_employer(&self, seed: &Company) -> RepoResult<SeedOutcome>;
}

/// SQLite-backed company repository.
pub struct SqliteCompanyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CompanyRepository for SqliteCompanyRepository<'_> {
    fn create_company(&self, company: &Company) -> RepoResult<CompanyId> {
        company.validate()?;
        insert_company(self.conn, company)?;
        Ok(company.id)
    }

    fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMPANY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_company_row(row)?));
        }
        Ok(None)
    }

    fn list_companies(&self, tenant_id: TenantId) -> RepoResult<Vec<Company>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPANY_SELECT_SQL}
             WHERE tenant_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([tenant_id.to_string()])?;
        let mut companies = Vec::new();
        while let Some(row) = rows.next()? {
            companies.push(parse_company_row(row)?);
        }
        Ok(companies)
    }

    fn ensure_default_employer(&self, seed: &Company) -> RepoResult<SeedOutcome> {
        if seed.kind != CompanyType::Employer {
            return Err(RepoError::InvalidData(
                "default employer seed must be an employer company".to_string(),
            ));
        }
        seed.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = oldest_employer(&tx, seed.tenant_id)?;
        let outcome = match existing {
            Some(employer) => SeedOutcome {
                employer,
                created: false,
            },
            None => {
                insert_company(&tx, seed)?;
                SeedOutcome {
                    employer: seed.clone(),
                    created: true,
                }
            }
        };
        tx.commit()?;
        Ok(outcome)
    }
}

fn insert_company(conn: &Connection, company: &Company) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO companies (
            id,
            tenant_id,
            name,
            registration_code,
            type,
            parent_employer_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            company.id.to_string(),
            company.tenant_id.to_string(),
            company.name.as_str(),
            company.registration_code.as_str(),
            company.kind.as_str(),
            company.parent_employer_id.map(|value| value.to_string()),
        ],
    )?;
    Ok(())
}

fn oldest_employer(conn: &Connection, tenant_id: TenantId) -> RepoResult<Option<Company>> {
    conn.query_row(
        &format!(
            "{COMPANY_SELECT_SQL}
             WHERE tenant_id = ?1
               AND type = 'employer'
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1;"
        ),
        [tenant_id.to_string()],
        |row| Ok(parse_company_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<Company> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "companies.id")?;
    let tenant_id = parse_uuid(&row.get::<_, String>("tenant_id")?, "companies.tenant_id")?;

    let type_text: String = row.get("type")?;
    let kind = CompanyType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid company type `{type_text}` in companies.type"))
    })?;

    let parent_employer_id = row
        .get::<_, Option<String>>("parent_employer_id")?
        .map(|value| parse_uuid(&value, "companies.parent_employer_id"))
        .transpose()?;

    let company = Company {
        id,
        tenant_id,
        name: row.get("name")?,
        registration_code: row.get("registration_code")?,
        kind,
        parent_employer_id,
    };
    company.validate()?;
    Ok(company)
}
