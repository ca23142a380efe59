// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process spreadsheet store.
//!
//! Backs `STORAGE_BACKEND=memory` for local development and the test suite.
//! Every operation is counted, and reads/appends can be made to fail on
//! demand so callers' fallback paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::TabularStore;
use crate::error::AppError;
use crate::models::{Region, Row, StoreId};

#[derive(Debug, Default)]
struct Spreadsheet {
    title: String,
    tabs: HashMap<Region, Vec<Row>>,
}

/// Operation counters, read through [`InMemoryStore::calls`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find: usize,
    pub create: usize,
    pub write_headers: usize,
    pub append: usize,
    pub read: usize,
    pub batch_read: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.find + self.create + self.write_headers + self.append + self.read + self.batch_read
    }
}

/// `TabularStore` kept entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    spreadsheets: Mutex<HashMap<String, Spreadsheet>>,
    next_id: AtomicUsize,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
    header_calls: AtomicUsize,
    read_calls: AtomicUsize,
    batch_read_calls: AtomicUsize,
    append_calls: Mutex<HashMap<Region, usize>>,
    fail_reads: AtomicBool,
    fail_batch_read: AtomicBool,
    fail_appends: Mutex<HashSet<Region>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully provisioned spreadsheet (all tabs with headers) and return its id.
    pub fn seed_store(&self, title: &str) -> StoreId {
        let id = self.allocate_id();
        let tabs = Region::ALL
            .iter()
            .map(|&region| (region, vec![header_row(region)]))
            .collect();
        lock(&self.spreadsheets).insert(
            id.as_str().to_string(),
            Spreadsheet {
                title: title.to_string(),
                tabs,
            },
        );
        id
    }

    /// Put rows directly into a region, bypassing counters.
    pub fn seed_rows(&self, id: &StoreId, region: Region, rows: Vec<Row>) {
        if let Some(sheet) = lock(&self.spreadsheets).get_mut(id.as_str()) {
            sheet.tabs.entry(region).or_default().extend(rows);
        }
    }

    /// Replace a region's contents with just its header row.
    pub fn clear_region(&self, id: &StoreId, region: Region) {
        if let Some(sheet) = lock(&self.spreadsheets).get_mut(id.as_str()) {
            sheet.tabs.insert(region, vec![header_row(region)]);
        }
    }

    /// All rows of a region, header included.
    pub fn rows(&self, id: &StoreId, region: Region) -> Vec<Row> {
        lock(&self.spreadsheets)
            .get(id.as_str())
            .and_then(|sheet| sheet.tabs.get(&region).cloned())
            .unwrap_or_default()
    }

    /// Number of spreadsheets carrying `title`.
    pub fn count_titled(&self, title: &str) -> usize {
        lock(&self.spreadsheets)
            .values()
            .filter(|sheet| sheet.title == title)
            .count()
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            find: self.find_calls.load(Ordering::SeqCst),
            create: self.create_calls.load(Ordering::SeqCst),
            write_headers: self.header_calls.load(Ordering::SeqCst),
            append: lock(&self.append_calls).values().sum(),
            read: self.read_calls.load(Ordering::SeqCst),
            batch_read: self.batch_read_calls.load(Ordering::SeqCst),
        }
    }

    /// Append calls issued against one region.
    pub fn append_calls(&self, region: Region) -> usize {
        lock(&self.append_calls).get(&region).copied().unwrap_or(0)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_batch_read(&self, fail: bool) {
        self.fail_batch_read.store(fail, Ordering::SeqCst);
    }

    /// Make appends to `region` fail until cleared.
    pub fn fail_appends_for(&self, region: Region) {
        lock(&self.fail_appends).insert(region);
    }

    fn allocate_id(&self) -> StoreId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        StoreId::new(format!("mem-sheet-{n}"))
    }

    fn read_range(&self, id: &StoreId, range: &str) -> Result<Vec<Row>, AppError> {
        let parsed = A1Range::parse(range)
            .ok_or_else(|| AppError::Storage(format!("Unable to parse range: {range}")))?;
        let sheets = lock(&self.spreadsheets);
        let sheet = sheets
            .get(id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("Spreadsheet {id}")))?;
        let rows = sheet
            .tabs
            .get(&parsed.region)
            .ok_or_else(|| AppError::Storage(format!("Unable to parse range: {range}")))?;
        Ok(parsed.slice(rows))
    }
}

fn header_row(region: Region) -> Row {
    region.header().iter().map(|h| h.to_string()).collect()
}

/// Minimal A1 notation: `Tab!A2:E`, `Tab!A1:E1`, `Tab!A:B`. Single-letter columns only.
#[derive(Debug, PartialEq)]
struct A1Range {
    region: Region,
    first_col: usize,
    last_col: usize,
    first_row: usize,
    last_row: Option<usize>,
}

impl A1Range {
    fn parse(range: &str) -> Option<Self> {
        let (tab, cells) = range.split_once('!')?;
        let region = Region::ALL.into_iter().find(|r| r.title() == tab)?;
        let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
        let (first_col, first_row) = parse_cell(start)?;
        let (last_col, last_row) = parse_cell(end)?;
        Some(Self {
            region,
            first_col,
            last_col,
            first_row: first_row.unwrap_or(1),
            last_row,
        })
    }

    /// Cells inside the range, trimmed the way Sheets returns them:
    /// no trailing empty cells and no trailing empty rows.
    fn slice(&self, rows: &[Row]) -> Vec<Row> {
        let end = self.last_row.unwrap_or(rows.len()).min(rows.len());
        let start = self.first_row.saturating_sub(1);
        let mut out: Vec<Row> = rows
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|row| {
                let mut cells: Row = row
                    .iter()
                    .skip(self.first_col)
                    .take((self.last_col + 1).saturating_sub(self.first_col))
                    .cloned()
                    .collect();
                while cells.last().is_some_and(|c| c.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        out
    }
}

fn parse_cell(cell: &str) -> Option<(usize, Option<usize>)> {
    let mut chars = cell.chars();
    let col = chars.next().filter(|c| c.is_ascii_uppercase())?;
    let rest = chars.as_str();
    let row = if rest.is_empty() {
        None
    } else {
        Some(rest.parse::<usize>().ok().filter(|r| *r >= 1)?)
    };
    Some(((col as u8 - b'A') as usize, row))
}

#[async_trait]
impl TabularStore for InMemoryStore {
    async fn find_by_name(&self, _token: &str, name: &str) -> Result<Option<StoreId>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let sheets = lock(&self.spreadsheets);
        let mut matches: Vec<&String> = sheets
            .iter()
            .filter(|(_, sheet)| sheet.title == name)
            .map(|(id, _)| id)
            .collect();
        matches.sort();
        Ok(matches.first().map(|id| StoreId::new(id.as_str())))
    }

    async fn create(
        &self,
        _token: &str,
        name: &str,
        regions: &[Region],
    ) -> Result<StoreId, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.allocate_id();
        let tabs = regions.iter().map(|&region| (region, Vec::new())).collect();
        lock(&self.spreadsheets).insert(
            id.as_str().to_string(),
            Spreadsheet {
                title: name.to_string(),
                tabs,
            },
        );
        Ok(id)
    }

    async fn write_headers(
        &self,
        _token: &str,
        id: &StoreId,
        headers: &[(Region, Row)],
    ) -> Result<(), AppError> {
        self.header_calls.fetch_add(1, Ordering::SeqCst);
        let mut sheets = lock(&self.spreadsheets);
        let sheet = sheets
            .get_mut(id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("Spreadsheet {id}")))?;
        for (region, header) in headers {
            let tab = sheet.tabs.entry(*region).or_default();
            match tab.first_mut() {
                Some(first) => *first = header.clone(),
                None => tab.push(header.clone()),
            }
        }
        Ok(())
    }

    async fn append_rows(
        &self,
        _token: &str,
        id: &StoreId,
        region: Region,
        rows: Vec<Row>,
    ) -> Result<(), AppError> {
        *lock(&self.append_calls).entry(region).or_insert(0) += 1;
        if lock(&self.fail_appends).contains(&region) {
            return Err(AppError::Storage(format!("Injected append failure for {region}")));
        }
        let mut sheets = lock(&self.spreadsheets);
        let sheet = sheets
            .get_mut(id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("Spreadsheet {id}")))?;
        let tab = sheet
            .tabs
            .get_mut(&region)
            .ok_or_else(|| AppError::Storage(format!("Unable to parse range: {region}")))?;
        tab.extend(rows);
        Ok(())
    }

    async fn read_rows(
        &self,
        _token: &str,
        id: &StoreId,
        range: &str,
    ) -> Result<Vec<Row>, AppError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Injected read failure".to_string()));
        }
        self.read_range(id, range)
    }

    async fn batch_read(
        &self,
        _token: &str,
        id: &StoreId,
        ranges: &[String],
    ) -> Result<Vec<Vec<Row>>, AppError> {
        self.batch_read_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch_read.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Injected batch read failure".to_string()));
        }
        ranges
            .iter()
            .map(|range| self.read_range(id, range))
            .collect()
    }
}
