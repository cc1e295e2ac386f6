use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;
use worktrack_core::db::open_db_in_memory;
use worktrack_core::{
    sqlite_service, AttributionConfig, AttributionError, Company, DetectionHints, Employee,
    MonthPeriod, SqliteAttributionService, TimeRecord,
};

struct Companies {
    alpha: Company,
    beta: Company,
    gamma: Company,
}

fn service(conn: &Connection, tenant: Uuid) -> SqliteAttributionService<'_> {
    sqlite_service(conn, tenant, AttributionConfig::default()).unwrap()
}

fn seed_companies(service: &SqliteAttributionService<'_>) -> Companies {
    let tenant = service.tenant_id();
    let alpha = service
        .create_company(&Company::employer(tenant, "Alpha Group", "556000-0001"))
        .unwrap();
    let beta = service
        .create_company(&Company::project(tenant, alpha.id, "Beta Consulting", "556000-0002"))
        .unwrap();
    let gamma = service
        .create_company(&Company::project(tenant, alpha.id, "Gamma Labs", "556000-0003"))
        .unwrap();
    Companies { alpha, beta, gamma }
}

fn employee_with_projects(
    service: &SqliteAttributionService<'_>,
    companies: &Companies,
) -> Employee {
    let mut employee = service.new_employee("E", companies.alpha.id);
    employee.project_company_ids = vec![companies.beta.id, companies.gamma.id];
    service.create_employee(&employee).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn work_context_lists_primary_then_projects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    let context = service.resolve_work_context(employee.id).unwrap();
    assert_eq!(
        context.available_company_ids(),
        vec![companies.alpha.id, companies.beta.id, companies.gamma.id]
    );
    assert!(context.can_switch);
    assert!(context.requires_selection);
    assert!(context.has_multiple_assignments);

    let again = service.resolve_work_context(employee.id).unwrap();
    assert_eq!(context, again);
}

#[test]
fn work_context_for_unknown_employee_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());

    let err = service.resolve_work_context(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, AttributionError::NotFound { .. }));
}

#[test]
fn untagged_activity_is_attributed_to_primary() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    let detected = service
        .detect_company(employee.id, &DetectionHints::default())
        .unwrap();
    assert_eq!(detected.company.id, companies.alpha.id);
    assert_eq!(detected.rule, "primary_company");
}

#[test]
fn client_id_matching_company_name_selects_that_company() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    let hints = DetectionHints {
        client_id: Some("beta".to_string()),
        ..DetectionHints::default()
    };
    let detected = service.detect_company(employee.id, &hints).unwrap();
    assert_eq!(detected.company.id, companies.beta.id);
    assert_eq!(detected.rule, "client_id");
}

#[test]
fn record_for_unavailable_company_is_access_denied() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);
    let delta = service
        .create_company(&Company::employer(service.tenant_id(), "Delta AB", "556000-0004"))
        .unwrap();

    let mut record = TimeRecord::new(employee.id, date(2024, 3, 4), 8.0);
    record.assigned_company_id = Some(delta.id);

    let result = service.validate_time_record(&record).unwrap();
    assert!(!result.valid);
    assert!(result.is_access_denied());
    assert!(result.suggestions.is_empty());

    let err = service.record_time(record).unwrap_err();
    assert!(matches!(err, AttributionError::AccessDenied { company_id, .. } if company_id == delta.id));
}

#[test]
fn week_overage_is_reported_but_valid() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    for day in 4..=8 {
        service
            .record_time(TimeRecord::new(employee.id, date(2024, 3, day), 10.0))
            .unwrap();
    }

    let record = TimeRecord::new(employee.id, date(2024, 3, 9), 11.0);
    let result = service.validate_time_record(&record).unwrap();
    assert!(result.valid);
    assert_eq!(result.issues.len(), 1);
    assert!(result.issues[0].contains("152.5%"));
    assert!(result.suggestions.is_empty());
}

#[test]
fn record_time_detects_company_and_suggests_project_code() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    let mut record = TimeRecord::new(employee.id, date(2024, 3, 5), 6.0);
    record.client_id = Some("GAMMA".to_string());
    let recorded = service.record_time(record).unwrap();

    assert_eq!(recorded.record.assigned_company_id, Some(companies.gamma.id));
    assert!(recorded.validation.valid);
    assert_eq!(recorded.validation.suggestions.len(), 1);
}

#[test]
fn record_time_rejects_negative_hours() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    let record = TimeRecord::new(employee.id, date(2024, 3, 5), -1.0);
    let err = service.record_time(record).unwrap_err();
    assert!(matches!(err, AttributionError::ValidationFailed(_)));
}

#[test]
fn distribution_groups_week_by_company() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    service
        .record_time(TimeRecord::new(employee.id, date(2024, 3, 4), 6.0))
        .unwrap();
    let mut project_record = TimeRecord::new(employee.id, date(2024, 3, 5), 2.0);
    project_record.assigned_company_id = Some(companies.beta.id);
    project_record.project_code = Some("B-1".to_string());
    service.record_time(project_record).unwrap();
    // Outside week 10.
    service
        .record_time(TimeRecord::new(employee.id, date(2024, 3, 11), 9.0))
        .unwrap();

    let distribution = service
        .get_timesheet_distribution(employee.id, 10, 2024)
        .unwrap();
    assert_eq!(distribution.week_start, date(2024, 3, 4));
    assert_eq!(distribution.week_end, date(2024, 3, 10));
    assert_eq!(distribution.sessions.len(), 3);
    assert_eq!(
        distribution.sessions.iter().filter(|s| s.is_primary).count(),
        1
    );
    assert_eq!(distribution.summary.total_hours, 8.0);
    assert_eq!(distribution.summary.primary_hours, 6.0);
    assert_eq!(distribution.summary.other_hours, 2.0);
    assert_eq!(
        distribution.summary.percentage_by_company[&companies.alpha.id],
        75.0
    );
    assert_eq!(
        distribution.summary.percentage_by_company[&companies.gamma.id],
        0.0
    );
}

#[test]
fn empty_week_has_zero_percentages_and_primary_session() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    let distribution = service
        .get_timesheet_distribution(employee.id, 1, 2025)
        .unwrap();
    assert_eq!(distribution.summary.total_hours, 0.0);
    assert!(distribution
        .summary
        .percentage_by_company
        .values()
        .all(|value| *value == 0.0));
    assert_eq!(
        distribution.primary_session().map(|s| s.company_id),
        Some(companies.alpha.id)
    );
}

#[test]
fn invalid_week_is_validation_failure() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    for week in [0, 53, 54] {
        let err = service
            .get_timesheet_distribution(employee.id, week, 2024)
            .unwrap_err();
        assert!(matches!(err, AttributionError::ValidationFailed(_)));
    }
    assert!(service
        .get_timesheet_distribution(employee.id, 53, 2020)
        .is_ok());
}

#[test]
fn hierarchy_reports_monthly_hours_per_company() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    service
        .record_time(TimeRecord::new(employee.id, date(2024, 3, 4), 7.5))
        .unwrap();
    let mut project_record = TimeRecord::new(employee.id, date(2024, 3, 28), 3.0);
    project_record.assigned_company_id = Some(companies.beta.id);
    service.record_time(project_record).unwrap();
    service
        .record_time(TimeRecord::new(employee.id, date(2024, 4, 1), 8.0))
        .unwrap();

    let hierarchy = service
        .resolve_hierarchy(MonthPeriod::new(2024, 3).unwrap())
        .unwrap();
    assert_eq!(hierarchy.default_employer_id, Some(companies.alpha.id));
    let alpha = hierarchy.employer(companies.alpha.id).unwrap();
    assert_eq!(alpha.stats.employee_count, 1);
    assert_eq!(alpha.stats.hours_in_period, 7.5);
    assert_eq!(alpha.projects.len(), 2);
    assert_eq!(alpha.group_hours(), 10.5);
    assert!(hierarchy.orphan_projects.is_empty());
}

#[test]
fn dangling_project_link_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    let employee = employee_with_projects(&service, &companies);

    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute(
        "DELETE FROM companies WHERE id = ?1;",
        [companies.gamma.id.to_string()],
    )
    .unwrap();

    let context = service.resolve_work_context(employee.id).unwrap();
    assert_eq!(
        context.available_company_ids(),
        vec![companies.alpha.id, companies.beta.id]
    );
}

#[test]
fn configured_contract_hours_drive_overage_limit() {
    let conn = open_db_in_memory().unwrap();
    let config = AttributionConfig::from_json_str(r#"{"defaultContractHoursPerWeek": 20}"#).unwrap();
    let service = sqlite_service(&conn, Uuid::new_v4(), config).unwrap();
    let companies = seed_companies(&service);
    let employee = service
        .create_employee(&service.new_employee("Part-time", companies.alpha.id))
        .unwrap();
    assert_eq!(employee.contract_hours_per_week, 20.0);

    service
        .record_time(TimeRecord::new(employee.id, date(2024, 3, 4), 25.0))
        .unwrap();
    let record = TimeRecord::new(employee.id, date(2024, 3, 5), 6.0);
    let result = service.validate_time_record(&record).unwrap();
    assert!(result.valid);
    assert_eq!(result.issues.len(), 1);
}

#[test]
fn corrupted_stored_company_is_repository_error() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, Uuid::new_v4());
    let companies = seed_companies(&service);
    conn.execute(
        "UPDATE companies SET name = '   ' WHERE id = ?1;",
        [companies.beta.id.to_string()],
    )
    .unwrap();

    let err = service.list_companies().unwrap_err();
    assert!(matches!(err, AttributionError::Repo(_)));

    let blank = Company::employer(service.tenant_id(), " ", "1");
    let err = service.create_company(&blank).unwrap_err();
    assert!(matches!(err, AttributionError::ValidationFailed(_)));
}
