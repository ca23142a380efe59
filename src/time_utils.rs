// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
///
/// This is the write-time stamp stored in the last column of every record row.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a calendar date as stored in the first column of a record row.
///
/// Accepts `YYYY-MM-DD`, and also a full RFC3339 timestamp (date part is used)
/// since rows edited by hand in the sheet sometimes carry one.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Short chart label for a date, e.g. `Jan 5`.
pub fn short_display_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
