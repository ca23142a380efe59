// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record writer: decomposes a journal entry into per-kind appends.
//!
//! One logical submission issues up to three independent appends
//! (workouts, metrics, note) concurrently. There is no cross-kind
//! transaction: a failed append does not undo the ones that succeeded,
//! and nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{JournalEntry, RecordKind};
use crate::services::locator::StoreLocator;
use crate::services::Caller;
use crate::time_utils::format_utc_rfc3339;

/// Result of a single-kind append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendStatus {
    /// This many rows were appended in one call.
    Written(usize),
    /// Nothing qualified for this kind; no remote call was made.
    Skipped,
}

/// Per-kind outcome within a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KindOutcome {
    Written { rows: usize },
    Skipped,
    Failed { error: String },
}

impl KindOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, KindOutcome::Failed { .. })
    }

    pub fn is_written(&self) -> bool {
        matches!(self, KindOutcome::Written { .. })
    }
}

impl From<Result<AppendStatus, AppError>> for KindOutcome {
    fn from(result: Result<AppendStatus, AppError>) -> Self {
        match result {
            Ok(AppendStatus::Written(rows)) => KindOutcome::Written { rows },
            Ok(AppendStatus::Skipped) => KindOutcome::Skipped,
            Err(e) => KindOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Outcome of one logical submission, one entry per record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub timestamp: String,
    pub workouts: KindOutcome,
    pub metrics: KindOutcome,
    pub note: KindOutcome,
}

impl SubmissionOutcome {
    pub fn kind(&self, kind: RecordKind) -> &KindOutcome {
        match kind {
            RecordKind::Workout => &self.workouts,
            RecordKind::Metric => &self.metrics,
            RecordKind::Note => &self.note,
        }
    }

    fn outcomes(&self) -> [&KindOutcome; 3] {
        [&self.workouts, &self.metrics, &self.note]
    }

    pub fn any_failed(&self) -> bool {
        self.outcomes().iter().any(|o| o.is_failed())
    }

    /// `ok` when nothing failed, `failed` when nothing was written and
    /// something failed, `partial` otherwise.
    pub fn status(&self) -> &'static str {
        if !self.any_failed() {
            "ok"
        } else if self.outcomes().iter().any(|o| o.is_written()) {
            "partial"
        } else {
            "failed"
        }
    }
}

/// Appends journal rows to the store.
#[derive(Clone)]
pub struct RecordWriter {
    locator: Arc<StoreLocator>,
}

impl RecordWriter {
    pub fn new(locator: Arc<StoreLocator>) -> Self {
        Self { locator }
    }

    /// Append the rows `entry` contributes to `kind`, stamped with `timestamp`.
    ///
    /// With zero qualifying rows this returns `Skipped` without touching
    /// the network, not even to resolve the store.
    pub async fn append(
        &self,
        caller: &Caller,
        kind: RecordKind,
        entry: &JournalEntry,
        timestamp: &str,
    ) -> Result<AppendStatus, AppError> {
        let rows = entry.rows_for(kind, timestamp);
        if rows.is_empty() {
            return Ok(AppendStatus::Skipped);
        }

        let id = self.locator.resolve(caller).await?;
        let count = rows.len();
        self.locator
            .store()
            .append_rows(&caller.access_token, &id, kind.region(), rows)
            .await?;

        tracing::debug!(kind = ?kind, rows = count, date = %entry.date, "Journal rows appended");
        Ok(AppendStatus::Written(count))
    }

    /// Write all three kinds of one entry concurrently and wait for all of them.
    pub async fn submit(&self, caller: &Caller, entry: &JournalEntry) -> SubmissionOutcome {
        let timestamp = format_utc_rfc3339(Utc::now());

        if !entry.has_content() {
            tracing::info!(email = %caller.email, date = %entry.date, "Journal entry has nothing to save");
            return SubmissionOutcome {
                timestamp,
                workouts: KindOutcome::Skipped,
                metrics: KindOutcome::Skipped,
                note: KindOutcome::Skipped,
            };
        }

        let (workouts, metrics, note) = tokio::join!(
            self.append(caller, RecordKind::Workout, entry, &timestamp),
            self.append(caller, RecordKind::Metric, entry, &timestamp),
            self.append(caller, RecordKind::Note, entry, &timestamp),
        );

        let outcome = SubmissionOutcome {
            timestamp,
            workouts: workouts.into(),
            metrics: metrics.into(),
            note: note.into(),
        };

        if outcome.any_failed() {
            tracing::warn!(
                email = %caller.email,
                date = %entry.date,
                status = outcome.status(),
                workouts = ?outcome.workouts,
                metrics = ?outcome.metrics,
                note = ?outcome.note,
                "Journal submission did not fully succeed"
            );
        } else {
            tracing::info!(email = %caller.email, date = %entry.date, "Journal entry saved");
        }

        outcome
    }
}
