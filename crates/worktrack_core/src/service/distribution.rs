//! Weekly distribution of worked hours across companies.
//!
//! # Invariants
//! - Exactly one session has `is_primary = true`, even with zero hours.
//! - Percentages are all zero when the grand total is zero and otherwise
//!   sum to 100 within floating point tolerance.
//! - Session order: primary, remaining available companies in context
//!   order, then companies only present in records sorted by id.

use crate::calendar::iso_week::WeekRange;
use crate::model::company::CompanyId;
use crate::model::employee::EmployeeId;
use crate::model::time_record::TimeRecord;
use crate::service::work_context::WorkContext;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Hours attributed to one company within the week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySession {
    pub company_id: CompanyId,
    pub total_hours: f64,
    pub record_count: usize,
    pub is_primary: bool,
}

/// Totals across all sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub total_hours: f64,
    pub primary_hours: f64,
    pub other_hours: f64,
    pub percentage_by_company: BTreeMap<CompanyId, f64>,
}

/// Snapshot of one employee's week, grouped by company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetDistribution {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub week: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub sessions: Vec<CompanySession>,
    pub summary: DistributionSummary,
}

impl TimesheetDistribution {
    /// Groups `records` by effective company. Records outside `range` are
    /// ignored.
    pub fn from_records(
        context: &WorkContext,
        year: i32,
        week: u32,
        range: WeekRange,
        records: &[TimeRecord],
    ) -> Self {
        let primary_id = context.primary_company_id();
        let mut sessions: Vec<CompanySession> = context
            .available_companies
            .iter()
            .map(|company| CompanySession {
                company_id: company.id,
                total_hours: 0.0,
                record_count: 0,
                is_primary: company.id == primary_id,
            })
            .collect();

        let mut historic: BTreeMap<CompanyId, CompanySession> = BTreeMap::new();
        for record in records.iter().filter(|record| range.contains(record.date)) {
            let company_id = record.effective_company_id(primary_id);
            let session = match sessions
                .iter_mut()
                .find(|session| session.company_id == company_id)
            {
                Some(session) => session,
                None => historic
                    .entry(company_id)
                    .or_insert_with(|| CompanySession {
                        company_id,
                        total_hours: 0.0,
                        record_count: 0,
                        is_primary: false,
                    }),
            };
            session.total_hours += record.total_hours();
            session.record_count += 1;
        }
        sessions.extend(historic.into_values());

        let summary = summarize(&sessions);
        Self {
            employee_id: context.employee_id,
            year,
            week,
            week_start: range.start,
            week_end: range.end,
            sessions,
            summary,
        }
    }

    /// Returns the primary company session.
    pub fn primary_session(&self) -> Option<&CompanySession> {
        self.sessions.iter().find(|session| session.is_primary)
    }

    /// Returns the session for `company_id`.
    pub fn session(&self, company_id: CompanyId) -> Option<&CompanySession> {
        self.sessions
            .iter()
            .find(|session| session.company_id == company_id)
    }
}

fn summarize(sessions: &[CompanySession]) -> DistributionSummary {
    let total_hours: f64 = sessions.iter().map(|session| session.total_hours).sum();
    let primary_hours: f64 = sessions
        .iter()
        .filter(|session| session.is_primary)
        .map(|session| session.total_hours)
        .sum();

    let percentage_by_company = sessions
        .iter()
        .map(|session| {
            let percentage = if total_hours > 0.0 {
                session.total_hours / total_hours * 100.0
            } else {
                0.0
            };
            (session.company_id, percentage)
        })
        .collect();

    DistributionSummary {
        total_hours,
        primary_hours,
        other_hours: total_hours - primary_hours,
        percentage_by_company,
    }
}
