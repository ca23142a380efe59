// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal records as stored in the data regions.
//!
//! Rows are mapped positionally, following the header order of each region.
//! Missing trailing cells read as blank. Numeric cells that are blank or
//! unparseable read as zero, so a stored `0` and an empty cell look the same.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::store::Row;

/// One exercise performed on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutRecord {
    pub date: String,
    pub exercise: String,
    pub sets: u32,
    /// Free-form, e.g. `10` or `8-10`
    pub reps: String,
    pub timestamp: String,
}

/// Body metrics recorded on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricRecord {
    pub date: String,
    pub weight: f64,
    pub bmi: f64,
    pub timestamp: String,
}

/// Free-text journal note for a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JournalNoteRecord {
    pub date: String,
    pub note: String,
    pub timestamp: String,
}

/// All three record collections, as returned by a full read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalData {
    pub workouts: Vec<WorkoutRecord>,
    pub metrics: Vec<MetricRecord>,
    pub notes: Vec<JournalNoteRecord>,
}

impl JournalData {
    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty() && self.metrics.is_empty() && self.notes.is_empty()
    }
}

fn cell(row: &Row, index: usize) -> String {
    row.get(index).cloned().unwrap_or_default()
}

fn number_or_zero(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn count_or_zero(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

impl WorkoutRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            date: cell(row, 0),
            exercise: cell(row, 1),
            sets: count_or_zero(&cell(row, 2)),
            reps: cell(row, 3),
            timestamp: cell(row, 4),
        }
    }
}

impl MetricRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            date: cell(row, 0),
            weight: number_or_zero(&cell(row, 1)),
            bmi: number_or_zero(&cell(row, 2)),
            timestamp: cell(row, 3),
        }
    }
}

impl JournalNoteRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            date: cell(row, 0),
            note: cell(row, 1),
            timestamp: cell(row, 2),
        }
    }
}

impl JournalData {
    /// Normalize raw rows from the workout, metric and note regions.
    pub fn from_rows(workouts: &[Row], metrics: &[Row], notes: &[Row]) -> Self {
        Self {
            workouts: workouts.iter().map(WorkoutRecord::from_row).collect(),
            metrics: metrics.iter().map(MetricRecord::from_row).collect(),
            notes: notes.iter().map(JournalNoteRecord::from_row).collect(),
        }
    }
}
