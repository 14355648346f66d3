//! Date parsing and formatting for use-case prompts.

use chrono::NaiveDate;

use crate::error::UseCaseError;

const INPUT_FORMAT: &str = "%Y-%m-%d";
const LONG_FORMAT: &str = "%B %d, %Y";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, UseCaseError> {
    NaiveDate::parse_from_str(input.trim(), INPUT_FORMAT)
        .map_err(|_| UseCaseError::InvalidDate(input.to_string()))
}

/// `2025-07-04` → `July 04, 2025`.
pub fn format_long_date(input: &str) -> Result<String, UseCaseError> {
    Ok(parse_date(input)?.format(LONG_FORMAT).to_string())
}

fn checked_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), UseCaseError> {
    let (start_date, end_date) = (parse_date(start)?, parse_date(end)?);
    if end_date < start_date {
        return Err(UseCaseError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok((start_date, end_date))
}

/// Human-readable range for pricing prompts: `July 01, 2025 - July 04, 2025`.
pub fn pricing_date_range(start: &str, end: &str) -> Result<String, UseCaseError> {
    let (start_date, end_date) = checked_range(start, end)?;
    Ok(format!(
        "{} - {}",
        start_date.format(LONG_FORMAT),
        end_date.format(LONG_FORMAT)
    ))
}

/// ISO range for forecast prompts: `2025-07-01 to 2025-07-04`.
pub fn forecast_date_range(start: &str, end: &str) -> Result<String, UseCaseError> {
    let (start_date, end_date) = checked_range(start, end)?;
    Ok(format!(
        "{} to {}",
        start_date.format(INPUT_FORMAT),
        end_date.format(INPUT_FORMAT)
    ))
}
