// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shapes raw journal data for the dashboard calendar and charts.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{JournalData, JournalNoteRecord, MetricRecord, WorkoutRecord};
use crate::time_utils::{parse_calendar_date, short_display_date};

/// One point of the weight/BMI chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricPoint {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub record: MetricRecord,
    /// Chart label (`Jan 5`); the raw date when it does not parse
    pub display_date: String,
}

/// Response of `GET /api/journal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardView {
    pub workouts: Vec<WorkoutRecord>,
    /// Ascending by date
    pub metrics: Vec<MetricPoint>,
    pub notes: Vec<JournalNoteRecord>,
    /// Distinct days with at least one workout, ascending (`YYYY-MM-DD`)
    pub attendance: Vec<String>,
}

impl DashboardView {
    pub fn from_data(data: JournalData) -> Self {
        let attendance: BTreeSet<NaiveDate> = data
            .workouts
            .iter()
            .filter_map(|w| parse_calendar_date(&w.date))
            .collect();

        let mut metrics: Vec<(Option<NaiveDate>, MetricRecord)> = data
            .metrics
            .into_iter()
            .map(|m| (parse_calendar_date(&m.date), m))
            .collect();
        // Stable sort; `None` orders before any date.
        metrics.sort_by_key(|(date, _)| *date);

        let metrics = metrics
            .into_iter()
            .map(|(date, record)| MetricPoint {
                display_date: date
                    .map(short_display_date)
                    .unwrap_or_else(|| record.date.clone()),
                record,
            })
            .collect();

        Self {
            workouts: data.workouts,
            metrics,
            notes: data.notes,
            attendance: attendance
                .into_iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
        }
    }
}
