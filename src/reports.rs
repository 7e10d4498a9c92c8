//! Date validation for the daily report shortcut.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportDateError {
    #[error("pick a date first")]
    Missing,
    #[error("'{0}' is not a valid date")]
    Invalid(String),
}

/// Parse the picker value as `YYYY-MM-DD`.
pub fn parse_report_date(input: &str) -> Result<NaiveDate, ReportDateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ReportDateError::Missing);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| ReportDateError::Invalid(input.to_string()))
}
