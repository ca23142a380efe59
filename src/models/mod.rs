// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod entry;
pub mod records;
pub mod store;
pub mod user;

pub use entry::{ExerciseEntry, JournalEntry, MetricsInput, RecordKind};
pub use records::{JournalData, JournalNoteRecord, MetricRecord, WorkoutRecord};
pub use store::{Region, Row, StoreId};
pub use user::{AccessStatus, AllowListEntry, UserProfile};
