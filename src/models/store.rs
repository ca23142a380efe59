// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backing spreadsheet identity and its named regions (tabs).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the backing spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named tab of the store, one per record kind plus the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Workouts,
    Metrics,
    DailyJournal,
    AllowedUsers,
}

impl Region {
    /// All regions, in the order tabs are created.
    pub const ALL: [Region; 4] = [
        Region::Workouts,
        Region::Metrics,
        Region::DailyJournal,
        Region::AllowedUsers,
    ];

    /// The three regions holding journal records.
    pub const DATA: [Region; 3] = [Region::Workouts, Region::Metrics, Region::DailyJournal];

    /// Tab title in the spreadsheet.
    pub fn title(self) -> &'static str {
        match self {
            Region::Workouts => "Workouts",
            Region::Metrics => "Metrics",
            Region::DailyJournal => "DailyJournal",
            Region::AllowedUsers => "AllowedUsers",
        }
    }

    /// Header row written when the store is created.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Region::Workouts => &["Date", "Exercise", "Sets", "Reps", "Timestamp"],
            Region::Metrics => &["Date", "Weight", "BMI", "Timestamp"],
            Region::DailyJournal => &["Date", "Note", "Timestamp"],
            Region::AllowedUsers => &["Email", "Date Added"],
        }
    }

    fn last_column(self) -> char {
        // header() is never wider than five columns
        (b'A' + self.header().len() as u8 - 1) as char
    }

    /// A1 range covering the header row, e.g. `Workouts!A1:E1`.
    pub fn header_range(self) -> String {
        format!("{}!A1:{}1", self.title(), self.last_column())
    }

    /// Whole-column range used as the append target, e.g. `Workouts!A:E`.
    pub fn append_range(self) -> String {
        format!("{}!A:{}", self.title(), self.last_column())
    }

    /// Everything below the header row, e.g. `Workouts!A2:E`.
    pub fn data_range(self) -> String {
        format!("{}!A2:{}", self.title(), self.last_column())
    }

    /// Allow-list email column below the header.
    pub fn email_column_range() -> String {
        format!("{}!A2:A", Region::AllowedUsers.title())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A row of cells as read from or written to a region.
pub type Row = Vec<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_match_header_width() {
        assert_eq!(Region::Workouts.header_range(), "Workouts!A1:E1");
        assert_eq!(Region::Metrics.header_range(), "Metrics!A1:D1");
        assert_eq!(Region::DailyJournal.header_range(), "DailyJournal!A1:C1");
        assert_eq!(Region::AllowedUsers.header_range(), "AllowedUsers!A1:B1");

        assert_eq!(Region::Workouts.append_range(), "Workouts!A:E");
        assert_eq!(Region::AllowedUsers.append_range(), "AllowedUsers!A:B");

        assert_eq!(Region::Metrics.data_range(), "Metrics!A2:D");
        assert_eq!(Region::DailyJournal.data_range(), "DailyJournal!A2:C");
        assert_eq!(Region::email_column_range(), "AllowedUsers!A2:A");
    }

    #[test]
    fn store_id_serializes_as_plain_string() {
        let id = StoreId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }
}
