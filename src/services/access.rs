// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access gate: allow-list check with a first-user bootstrap rule.
//!
//! The allow-list lives in the `AllowedUsers` tab. An empty list means
//! "not initialized yet", and whoever is checked first against it is added
//! and granted. Entries are otherwise maintained by editing the sheet.
//!
//! Any failure while checking is a denial (fail closed).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{AllowListEntry, Region, StoreId};
use crate::services::locator::StoreLocator;
use crate::services::Caller;
use crate::store::TabularStore;
use crate::time_utils::format_utc_rfc3339;

/// Result of [`ensure_bootstrap_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// The allow-list was empty and the caller was appended to it.
    Added,
    /// The allow-list already had entries; these are the listed emails.
    AlreadyInitialized(Vec<String>),
}

/// Add the caller to an empty allow-list.
///
/// Check-then-act against the remote sheet without any server-side
/// uniqueness guarantee: two callers racing on an empty list can both be
/// added.
pub async fn ensure_bootstrap_admin(
    store: &dyn TabularStore,
    caller: &Caller,
    id: &StoreId,
    now: DateTime<Utc>,
) -> Result<Bootstrap, AppError> {
    let emails: Vec<String> = store
        .read_rows(&caller.access_token, id, &Region::email_column_range())
        .await?
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter(|email| !email.trim().is_empty())
        .collect();

    if !emails.is_empty() {
        return Ok(Bootstrap::AlreadyInitialized(emails));
    }

    let entry = AllowListEntry {
        email: caller.email.clone(),
        date_added: format_utc_rfc3339(now),
    };
    store
        .append_rows(
            &caller.access_token,
            id,
            Region::AllowedUsers,
            vec![entry.to_row()],
        )
        .await?;

    tracing::info!(email = %caller.email, store_id = %id, "Bootstrap admin added to empty allow-list");
    Ok(Bootstrap::Added)
}

/// Grants or denies journal access based on the store's allow-list.
#[derive(Clone)]
pub struct AccessGate {
    locator: Arc<StoreLocator>,
}

impl AccessGate {
    pub fn new(locator: Arc<StoreLocator>) -> Self {
        Self { locator }
    }

    /// Whether `caller.email` may use the journal. Never fails: errors deny.
    pub async fn check_access(&self, caller: &Caller) -> bool {
        match self.try_check_access(caller).await {
            Ok(granted) => {
                tracing::info!(email = %caller.email, granted, "Access check completed");
                granted
            }
            Err(e) => {
                tracing::error!(email = %caller.email, error = %e, "Error checking access, denying");
                false
            }
        }
    }

    async fn try_check_access(&self, caller: &Caller) -> Result<bool, AppError> {
        let id = self.locator.resolve(caller).await?;

        match ensure_bootstrap_admin(self.locator.store().as_ref(), caller, &id, Utc::now())
            .await?
        {
            Bootstrap::Added => Ok(true),
            Bootstrap::AlreadyInitialized(emails) => Ok(emails
                .iter()
                .any(|listed| AllowListEntry::matches(listed, &caller.email))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn bootstrap_is_a_no_op_once_initialized() {
        let store = InMemoryStore::new();
        let id = store.seed_store("GymJournalData");
        let first = Caller::new("first@example.com", "t");
        let second = Caller::new("second@example.com", "t");

        let added = ensure_bootstrap_admin(&store, &first, &id, Utc::now())
            .await
            .unwrap();
        assert_eq!(added, Bootstrap::Added);

        let again = ensure_bootstrap_admin(&store, &second, &id, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            again,
            Bootstrap::AlreadyInitialized(vec!["first@example.com".to_string()])
        );
        assert_eq!(store.rows(&id, Region::AllowedUsers).len(), 2);
    }
}
