// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage backend boundary.
//!
//! The journal keeps everything in one spreadsheet. [`TabularStore`] is the
//! narrow set of spreadsheet operations the services need; [`sheets`] talks
//! to Google Drive and Sheets, [`memory`] keeps everything in process.

pub mod cache;
pub mod memory;
pub mod sheets;

pub use cache::{FileStoreIdCache, MemoryStoreIdCache, StoreIdCache, STORE_ID_CACHE_KEY};
pub use memory::InMemoryStore;
pub use sheets::GoogleSheetsStore;

use crate::error::AppError;
use crate::models::{Region, Row, StoreId};
use async_trait::async_trait;

/// Spreadsheet operations used by the journal services.
///
/// Every call carries the caller's OAuth access token; implementations
/// that do not talk to Google ignore it.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Find a non-trashed spreadsheet with exactly this title.
    async fn find_by_name(&self, token: &str, name: &str) -> Result<Option<StoreId>, AppError>;

    /// Create a spreadsheet with one tab per region, in the given order.
    async fn create(
        &self,
        token: &str,
        name: &str,
        regions: &[Region],
    ) -> Result<StoreId, AppError>;

    /// Write header rows for several regions in one batched call.
    async fn write_headers(
        &self,
        token: &str,
        id: &StoreId,
        headers: &[(Region, Row)],
    ) -> Result<(), AppError>;

    /// Append rows after the last non-empty row of a region.
    async fn append_rows(
        &self,
        token: &str,
        id: &StoreId,
        region: Region,
        rows: Vec<Row>,
    ) -> Result<(), AppError>;

    /// Read all rows of an A1 range.
    async fn read_rows(&self, token: &str, id: &StoreId, range: &str)
        -> Result<Vec<Row>, AppError>;

    /// Read several A1 ranges in one round trip. Results follow request order.
    async fn batch_read(
        &self,
        token: &str,
        id: &StoreId,
        ranges: &[String],
    ) -> Result<Vec<Vec<Row>>, AppError>;
}
