#![allow(dead_code)]

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::constants::RECEIPT_DATE_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) enum Environment {
    /// The receipt was generated in the sandbox environment.
    Sandbox,
    /// The receipt was generated in the production environment.
    Production,

    #[serde(untagged)]
    Unknown(String),
}

/// Parses a textual receipt date such as `2024-05-01 12:00:00 Etc/GMT`.
///
/// Dates are always expressed in UTC; any zone label after the time is
/// ignored.
pub(crate) fn parse_receipt_date(text: &str) -> Option<DateTime<Utc>> {
    let mut parts = text.split_whitespace();
    let date = parts.next()?;
    let time = parts.next()?;
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), RECEIPT_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}
