//! Calendar arithmetic shared by aggregation and validation.
//!
//! # Responsibility
//! - Map dates to ISO week numbers and weeks back to date ranges.
//!
//! # Invariants
//! - `week_number(week_dates(year, week)[0]) == week` for every valid pair.

pub mod iso_week;
