//! `MM/dd/yyyy` request dates.

use chrono::{DateTime, NaiveDate, Utc};
use engine::DateRange;

use crate::ServerError;

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Parse `MM/dd/yyyy` as the start of that day in UTC.
pub(crate) fn parse_date(value: &str) -> Result<DateTime<Utc>, ServerError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ServerError::Generic(format!("invalid date '{value}', expected MM/dd/yyyy"))
        })
}

pub(crate) fn parse_optional_date(
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ServerError> {
    value.map(parse_date).transpose()
}

/// Both bounds are required.
pub(crate) fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, ServerError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange::new(parse_date(start)?, parse_date(end)?)?),
        _ => Err(ServerError::Generic(
            "start and end query parameters are required".to_string(),
        )),
    }
}

/// Either both bounds or none.
pub(crate) fn parse_optional_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<DateRange>, ServerError> {
    match (start, end) {
        (None, None) => Ok(None),
        _ => parse_range(start, end).map(Some),
    }
}
