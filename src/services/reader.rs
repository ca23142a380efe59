// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record reader: one batched full read of the three data regions.
//!
//! Best-effort. Any failure is logged and reads as empty data.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::{JournalData, Region};
use crate::services::locator::StoreLocator;
use crate::services::Caller;

#[derive(Clone)]
pub struct RecordReader {
    locator: Arc<StoreLocator>,
}

impl RecordReader {
    pub fn new(locator: Arc<StoreLocator>) -> Self {
        Self { locator }
    }

    /// All workouts, metrics and notes. Never fails.
    pub async fn fetch_all(&self, caller: &Caller) -> JournalData {
        match self.try_fetch_all(caller).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(email = %caller.email, error = %e, "Error fetching journal data");
                JournalData::default()
            }
        }
    }

    async fn try_fetch_all(&self, caller: &Caller) -> Result<JournalData, AppError> {
        let id = self.locator.resolve(caller).await?;

        let ranges: Vec<String> = Region::DATA.iter().map(|r| r.data_range()).collect();
        let regions = self
            .locator
            .store()
            .batch_read(&caller.access_token, &id, &ranges)
            .await?;

        let [workouts, metrics, notes] = <[_; 3]>::try_from(regions).map_err(|got| {
            AppError::Storage(format!(
                "Batched read returned {} regions, expected 3",
                got.len()
            ))
        })?;

        let data = JournalData::from_rows(&workouts, &metrics, &notes);
        tracing::debug!(
            workouts = data.workouts.len(),
            metrics = data.metrics.len(),
            notes = data.notes.len(),
            "Journal data fetched"
        );
        Ok(data)
    }
}
