//! Parsing of untrusted field strings into typed values.
//!
//! Shared by stock construction and update so both paths accept and reject
//! exactly the same inputs.

use core::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use madmin_core::{DomainError, DomainResult};
use rust_decimal::Decimal;

use crate::distributor::DistributorId;

/// Wire format of expiration dates: ISO-8601, millisecond precision, UTC `Z`.
pub const EXPIRATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Parse a mandatory expiration date.
pub fn parse_expiration_date(s: &str) -> DomainResult<DateTime<Utc>> {
    if s.is_empty() {
        return Err(DomainError::validation("expected expiration date but not set"));
    }
    // `%.3f` also matches a missing fraction, so the millisecond part is checked by hand.
    let has_millis = s
        .strip_suffix('Z')
        .and_then(|rest| rest.rsplit_once('.'))
        .is_some_and(|(_, frac)| frac.len() == 3 && frac.bytes().all(|b| b.is_ascii_digit()));
    if !has_millis {
        return Err(DomainError::validation(format!(
            "malformed expiration date {s:?}: expected milliseconds and a trailing Z"
        )));
    }
    NaiveDateTime::parse_from_str(s, EXPIRATION_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::validation(format!("malformed expiration date {s:?}: {e}")))
}

/// Render a date in the same format `parse_expiration_date` accepts.
pub fn format_expiration_date(date: &DateTime<Utc>) -> String {
    date.format(EXPIRATION_DATE_FORMAT).to_string()
}

/// Parse the mandatory on-hand quantity. Must be a non-negative decimal.
///
/// The textual scale is preserved (`"12.50"` stays `12.50`).
pub fn parse_quantity(s: &str) -> DomainResult<Decimal> {
    if s.is_empty() {
        return Err(DomainError::validation("no quantity set for stock"));
    }
    let quantity = parse_decimal(s, "quantity")?;
    if quantity < Decimal::ZERO {
        return Err(DomainError::validation(format!("quantity cannot be negative: {s}")));
    }
    Ok(quantity)
}

/// Parse the optional reorder threshold; empty means zero.
pub fn parse_min_quantity(s: &str) -> DomainResult<Decimal> {
    if s.is_empty() {
        return Ok(Decimal::ZERO);
    }
    parse_decimal(s, "min quantity")
}

/// Parse an optional distributor reference; empty means "no distributor".
pub fn parse_distributor_id(s: &str) -> DomainResult<Option<DistributorId>> {
    if s.is_empty() {
        return Ok(None);
    }
    DistributorId::from_str(s).map(Some)
}

/// Display names must contain something other than whitespace.
pub fn validate_name(name: &str) -> DomainResult<String> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Exact decimal parse: digit separators and precision loss are errors.
fn parse_decimal(s: &str, field: &str) -> DomainResult<Decimal> {
    if s.contains('_') {
        return Err(DomainError::validation(format!("malformed {field} {s:?}: digit separator")));
    }
    Decimal::from_str_exact(s)
        .map_err(|e| DomainError::validation(format!("malformed {field} {s:?}: {e}")))
}
