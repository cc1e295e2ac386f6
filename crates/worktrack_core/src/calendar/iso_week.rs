//! ISO-8601 week arithmetic.
//!
//! Both directions follow the Thursday rule: a week belongs to the year that
//! contains its Thursday, and week 1 is the week containing January 4.

use chrono::{Datelike, Duration, NaiveDate};

/// Highest week number any ISO year can have.
pub const MAX_WEEK: u32 = 53;

/// Seven consecutive days starting on a Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    /// Returns the seven dates of this week in order.
    pub fn days(&self) -> [NaiveDate; 7] {
        let mut days = [self.start; 7];
        for (offset, day) in days.iter_mut().enumerate() {
            *day = self.start + Duration::days(offset as i64);
        }
        days
    }

    /// Returns whether `date` falls inside this week.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Returns the ISO week number of `date`.
pub fn week_number(date: NaiveDate) -> u32 {
    iso_week(date).1
}

/// Returns `(week_year, week_number)` for `date`.
///
/// `week_year` is the year of the Thursday of the date's week, which differs
/// from `date.year()` around New Year.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let iso_weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date + Duration::days(4 - iso_weekday);
    let year_start = NaiveDate::from_ymd_opt(thursday.year(), 1, 1).unwrap_or(thursday);
    let elapsed_days = (thursday - year_start).num_days();
    let week = ((elapsed_days + 1) as f64 / 7.0).ceil() as u32;
    (thursday.year(), week)
}

/// Returns the Monday-to-Sunday range of ISO week `week` in `year`.
///
/// Returns `None` when `week` is outside `1..=53`, when `year` has only 52
/// weeks and `week` is 53, or when the year cannot be represented.
pub fn week_dates(year: i32, week: u32) -> Option<WeekRange> {
    if !(1..=MAX_WEEK).contains(&week) {
        return None;
    }
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    let first_monday = jan4 - Duration::days(i64::from(jan4.weekday().num_days_from_monday()));
    let start = first_monday.checked_add_signed(Duration::days(i64::from(week - 1) * 7))?;
    if iso_week(start) != (year, week) {
        return None;
    }
    let end = start.checked_add_signed(Duration::days(6))?;
    Some(WeekRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::{iso_week, week_dates, week_number};
    use chrono::{Datelike, NaiveDate, Weekday};

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn week_number_matches_known_dates() {
        assert_eq!(week_number(ymd(2024, 1, 1)), 1);
        assert_eq!(week_number(ymd(2024, 12, 30)), 1);
        assert_eq!(week_number(ymd(2021, 1, 3)), 53);
        assert_eq!(week_number(ymd(2026, 10, 18)), 42);
    }

    #[test]
    fn iso_week_reports_thursday_year() {
        assert_eq!(iso_week(ymd(2024, 12, 30)), (2025, 1));
        assert_eq!(iso_week(ymd(2021, 1, 3)), (2020, 53));
        assert_eq!(iso_week(ymd(2023, 6, 15)), (2023, 24));
    }

    #[test]
    fn week_dates_starts_on_monday_and_spans_seven_days() {
        let range = week_dates(2024, 1).unwrap();
        assert_eq!(range.start, ymd(2024, 1, 1));
        assert_eq!(range.end, ymd(2024, 1, 7));
        assert_eq!(range.start.weekday(), Weekday::Mon);
        assert_eq!(range.days()[6], range.end);

        let range = week_dates(2021, 1).unwrap();
        assert_eq!(range.start, ymd(2021, 1, 4));
    }

    #[test]
    fn week_dates_rejects_out_of_range_weeks() {
        assert!(week_dates(2024, 0).is_none());
        assert!(week_dates(2024, 54).is_none());
    }

    #[test]
    fn week_53_is_rejected_for_short_years() {
        for year in [2019, 2021, 2023, 2024, 2025] {
            assert!(week_dates(year, 53).is_none(), "year {year}");
        }
    }

    #[test]
    fn week_number_inverts_week_dates() {
        for year in 1990..=2040 {
            for week in 1..=52 {
                let range = week_dates(year, week).unwrap();
                assert_eq!(week_number(range.start), week, "year {year} week {week}");
                assert_eq!(iso_week(range.end), (year, week));
            }
        }
    }

    #[test]
    fn week_53_inverts_for_long_years() {
        for year in [2004, 2009, 2015, 2020, 2026] {
            let range = week_dates(year, 53).unwrap();
            assert_eq!(iso_week(range.start), (year, 53));
        }
    }
}
