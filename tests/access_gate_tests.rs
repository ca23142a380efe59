// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Allow-list access checks, including the empty-list bootstrap rule.

use gym_journal::models::Region;
use gym_journal::services::AccessGate;

mod common;

#[tokio::test]
async fn test_listed_email_granted_in_any_case() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::AllowedUsers,
        vec![
            common::row(&["Owner@Example.com", "2024-01-01T00:00:00.000Z"]),
            common::row(&["friend@example.com", "2024-01-02T00:00:00.000Z"]),
        ],
    );
    let gate = AccessGate::new(locator);

    for email in ["owner@example.com", "OWNER@EXAMPLE.COM", "Friend@Example.Com"] {
        assert!(
            gate.check_access(&common::caller(email)).await,
            "{email} should be granted"
        );
    }

    // Checks never add anyone to a populated list
    assert_eq!(store.rows(&id, Region::AllowedUsers).len(), 3);
    assert_eq!(store.append_calls(Region::AllowedUsers), 0);
}

#[tokio::test]
async fn test_unlisted_email_denied_when_list_populated() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::AllowedUsers,
        vec![common::row(&["owner@example.com", "2024-01-01T00:00:00.000Z"])],
    );
    let gate = AccessGate::new(locator);

    assert!(!gate.check_access(&common::caller("stranger@example.com")).await);
    assert!(!gate.check_access(&common::caller("owner@example.co")).await);
    assert_eq!(store.rows(&id, Region::AllowedUsers).len(), 2);
}

#[tokio::test]
async fn test_empty_list_bootstraps_first_caller() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    let gate = AccessGate::new(locator);

    assert!(gate.check_access(&common::caller("first@example.com")).await);

    let rows = store.rows(&id, Region::AllowedUsers);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "first@example.com");
    assert!(!rows[1][1].is_empty());

    // The list is no longer empty, so the next stranger is turned away
    assert!(!gate.check_access(&common::caller("second@example.com")).await);
    assert!(gate.check_access(&common::caller("FIRST@example.com")).await);
}

#[tokio::test]
async fn test_manually_cleared_list_bootstraps_again() {
    let (locator, store) = common::test_locator();
    let gate = AccessGate::new(locator.clone());

    // First check provisions the store and lists the creator
    assert!(gate.check_access(&common::caller("owner@example.com")).await);
    assert_eq!(store.count_titled("GymJournalData"), 1);

    let id = locator
        .resolve(&common::caller("owner@example.com"))
        .await
        .unwrap();
    store.clear_region(&id, Region::AllowedUsers);

    assert!(gate.check_access(&common::caller("next@example.com")).await);
    let rows = store.rows(&id, Region::AllowedUsers);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "next@example.com");
}

#[tokio::test]
async fn test_blank_rows_do_not_count_as_entries() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(&id, Region::AllowedUsers, vec![common::row(&["", ""])]);
    let gate = AccessGate::new(locator);

    assert!(gate.check_access(&common::caller("first@example.com")).await);
}

#[tokio::test]
async fn test_read_failure_denies() {
    let (locator, store) = common::test_locator();
    let id = store.seed_store("GymJournalData");
    store.seed_rows(
        &id,
        Region::AllowedUsers,
        vec![common::row(&["owner@example.com", "2024-01-01T00:00:00.000Z"])],
    );
    store.set_fail_reads(true);
    let gate = AccessGate::new(locator);

    // Even a listed user is denied when the list cannot be read
    assert!(!gate.check_access(&common::caller("owner@example.com")).await);
    assert_eq!(store.append_calls(Region::AllowedUsers), 0);
}
