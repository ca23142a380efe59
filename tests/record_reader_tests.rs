// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Full journal reads and the empty-on-failure fallback.

use gym_journal::models::{JournalData, Region};
use gym_journal::services::{DashboardView, RecordReader};

mod common;

#[tokio::test]
async fn test_metric_rows_are_parsed_positionally() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::Metrics,
        vec![
            common::row(&["2024-01-01", "70", "22.5", "t1"]),
            common::row(&["2024-01-02", "", "22.7", "t2"]),
        ],
    );
    let reader = RecordReader::new(locator);

    let data = reader.fetch_all(&common::caller(common::TEST_EMAIL)).await;

    assert_eq!(data.metrics.len(), 2);
    assert_eq!(data.metrics[0].date, "2024-01-01");
    assert_eq!(data.metrics[0].weight, 70.0);
    assert_eq!(data.metrics[0].bmi, 22.5);
    assert_eq!(data.metrics[0].timestamp, "t1");
    assert_eq!(data.metrics[1].weight, 0.0);
    assert_eq!(data.metrics[1].bmi, 22.7);

    // Headers are never returned as records
    assert!(data.workouts.is_empty());
    assert!(data.notes.is_empty());
    assert_eq!(store.calls().batch_read, 1);
}

#[tokio::test]
async fn test_all_regions_read_in_one_batch() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::Workouts,
        vec![
            common::row(&["2024-01-01", "Bench", "3", "10", "t1"]),
            common::row(&["2024-01-01", "Row", "abc"]),
        ],
    );
    store.seed_rows(
        &id,
        Region::DailyJournal,
        vec![common::row(&["2024-01-01", "Felt strong", "t1"])],
    );
    let reader = RecordReader::new(locator);

    let data = reader.fetch_all(&common::caller(common::TEST_EMAIL)).await;

    assert_eq!(data.workouts.len(), 2);
    assert_eq!(data.workouts[0].sets, 3);
    assert_eq!(data.workouts[0].reps, "10");
    // Unparseable and missing cells read as zero / blank
    assert_eq!(data.workouts[1].sets, 0);
    assert_eq!(data.workouts[1].reps, "");
    assert_eq!(data.workouts[1].timestamp, "");
    assert_eq!(data.notes.len(), 1);
    assert_eq!(data.notes[0].note, "Felt strong");

    let calls = store.calls();
    assert_eq!(calls.batch_read, 1);
    assert_eq!(calls.read, 0);
}

#[tokio::test]
async fn test_batch_read_failure_returns_empty_collections() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::Metrics,
        vec![common::row(&["2024-01-01", "70", "22.5", "t1"])],
    );
    store.set_fail_batch_read(true);
    let reader = RecordReader::new(locator);

    let data = reader.fetch_all(&common::caller(common::TEST_EMAIL)).await;

    assert_eq!(data, JournalData::default());
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_resolve_failure_returns_empty_collections() {
    let (locator, store) = common::test_locator();
    // No store exists, and provisioning fails at the allow-list read
    store.set_fail_reads(true);
    let reader = RecordReader::new(locator);

    let data = reader.fetch_all(&common::caller(common::TEST_EMAIL)).await;

    assert!(data.is_empty());
    assert_eq!(store.calls().batch_read, 0);
}

#[tokio::test]
async fn test_dashboard_from_fetched_data() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::Metrics,
        vec![
            common::row(&["2024-02-01", "79", "24", "t2"]),
            common::row(&["2024-01-05", "80", "24.2", "t1"]),
        ],
    );
    store.seed_rows(
        &id,
        Region::Workouts,
        vec![
            common::row(&["2024-02-01", "Bench", "3", "10", "t2"]),
            common::row(&["2024-02-01", "Squat", "5", "5", "t2"]),
            common::row(&["2024-01-05", "Bench", "3", "8", "t1"]),
        ],
    );
    let reader = RecordReader::new(locator);

    let view = DashboardView::from_data(reader.fetch_all(&common::caller(common::TEST_EMAIL)).await);

    assert_eq!(view.workouts.len(), 3);
    let dates: Vec<&str> = view.metrics.iter().map(|m| m.record.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-05", "2024-02-01"]);
    assert_eq!(view.metrics[0].display_date, "Jan 5");
    assert_eq!(view.attendance, vec!["2024-01-05", "2024-02-01"]);
}
