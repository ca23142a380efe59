// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry as submitted from the journal form.
//!
//! An entry is never stored as a unit. It is decomposed into up to three
//! independent batches of rows (workouts, metrics, note), one per region.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::models::store::{Region, Row};
use crate::time_utils::parse_calendar_date;

pub const MAX_EXERCISES: u64 = 50;
pub const MAX_EXERCISE_NAME_LEN: u64 = 100;
pub const MAX_NOTE_LEN: u64 = 5000;

/// The record kinds written by one logical submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Workout,
    Metric,
    Note,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Workout, RecordKind::Metric, RecordKind::Note];

    pub fn region(self) -> Region {
        match self {
            RecordKind::Workout => Region::Workouts,
            RecordKind::Metric => Region::Metrics,
            RecordKind::Note => Region::DailyJournal,
        }
    }
}

/// One exercise line of the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExerciseEntry {
    #[serde(default)]
    #[validate(length(max = MAX_EXERCISE_NAME_LEN))]
    pub name: String,
    #[serde(default, deserialize_with = "optional_number")]
    pub sets: Option<u32>,
    #[serde(default, deserialize_with = "optional_text")]
    pub reps: Option<String>,
}

/// Body metrics section of the form. Both fields may be left blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MetricsInput {
    #[serde(default, deserialize_with = "optional_measure")]
    #[validate(range(min = 0.0))]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "optional_measure")]
    #[validate(range(min = 0.0))]
    pub bmi: Option<f64>,
}

impl MetricsInput {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.bmi.is_none()
    }
}

/// One date's exercises, metrics and note, before decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct JournalEntry {
    #[validate(custom(function = "validate_date"))]
    pub date: String,
    #[serde(default)]
    #[validate(length(max = MAX_EXERCISES), nested)]
    pub exercises: Vec<ExerciseEntry>,
    #[serde(default)]
    #[validate(nested)]
    pub metrics: MetricsInput,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub note: String,
}

impl JournalEntry {
    /// Rows this entry contributes to `kind`'s region, stamped with `timestamp`.
    ///
    /// Empty means nothing to write for that kind:
    /// - workouts: one row per exercise with a non-empty name
    /// - metrics: one row if weight or BMI is present
    /// - note: one row if the note is non-empty
    pub fn rows_for(&self, kind: RecordKind, timestamp: &str) -> Vec<Row> {
        match kind {
            RecordKind::Workout => self
                .exercises
                .iter()
                .filter(|ex| !ex.name.is_empty())
                .map(|ex| {
                    vec![
                        self.date.clone(),
                        ex.name.clone(),
                        ex.sets.map(|s| s.to_string()).unwrap_or_default(),
                        ex.reps.clone().unwrap_or_default(),
                        timestamp.to_string(),
                    ]
                })
                .collect(),
            RecordKind::Metric => {
                if self.metrics.is_empty() {
                    return Vec::new();
                }
                vec![vec![
                    self.date.clone(),
                    self.metrics.weight.map(|w| w.to_string()).unwrap_or_default(),
                    self.metrics.bmi.map(|b| b.to_string()).unwrap_or_default(),
                    timestamp.to_string(),
                ]]
            }
            RecordKind::Note => {
                if self.note.is_empty() {
                    return Vec::new();
                }
                vec![vec![
                    self.date.clone(),
                    self.note.clone(),
                    timestamp.to_string(),
                ]]
            }
        }
    }

    /// Whether the entry carries anything at all to persist.
    pub fn has_content(&self) -> bool {
        RecordKind::ALL
            .iter()
            .any(|&kind| !self.rows_for(kind, "").is_empty())
    }
}

fn validate_date(date: &str) -> Result<(), ValidationError> {
    if date.len() == 10 && parse_calendar_date(date).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("date_format"))
    }
}

/// Form inputs arrive as numbers, numeric strings, empty strings or null.
fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;

    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => return Err(D::Error::custom(format!("expected a number, got {other}"))),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid number {trimmed:?}: {e}")))
}

/// A body measurement: like `optional_number`, but NaN and infinities are rejected.
fn optional_measure<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match optional_number::<D, f64>(deserializer)? {
        Some(value) if !value.is_finite() => Err(D::Error::custom(format!(
            "invalid number {value}: must be finite"
        ))),
        value => Ok(value),
    }
}

/// Reps may be typed as `10` or `"8-10"`.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected text or number, got {other}"
        ))),
    }
}
