use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::types::DATE_FORMAT;

const MAX_NAME_LEN: usize = 100;
const MAX_TIME_LEN: usize = 10;

pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::bad_request(format!("{field} cannot be empty")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(Error::bad_request(format!(
            "{field} cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

pub fn validate_email(value: &str) -> Result<String> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(value.to_string())
        }
        _ => Err(Error::bad_request(format!("'{value}' is not a valid email"))),
    }
}

pub fn validate_positive(field: &str, value: i32) -> Result<i32> {
    if value <= 0 {
        return Err(Error::bad_request(format!("{field} must be positive")));
    }
    Ok(value)
}

/// Parses a `YYYY-MM-DD` reservation date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        Error::bad_request(format!("invalid date '{value}', expected YYYY-MM-DD"))
    })
}

/// Reservation times are free text (usually `HH:MM`) but must fit the column.
pub fn validate_time(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::bad_request("horario cannot be empty"));
    }
    if value.chars().count() > MAX_TIME_LEN {
        return Err(Error::bad_request(format!(
            "horario cannot exceed {MAX_TIME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}
