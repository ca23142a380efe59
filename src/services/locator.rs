// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store locator: resolves the single backing spreadsheet.
//!
//! Resolution order:
//! 1. Cached id (trusted without re-validation)
//! 2. Drive search by reserved title, non-trashed only
//! 3. Create spreadsheet + tabs, write all headers in one batch, bootstrap
//!    the caller as the first allow-listed user
//!
//! A failure part-way through creation is returned to the caller as-is.
//! Nothing is cleaned up, so a half-provisioned spreadsheet can remain.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::{Region, Row, StoreId};
use crate::services::access::ensure_bootstrap_admin;
use crate::services::Caller;
use crate::store::{StoreIdCache, TabularStore, STORE_ID_CACHE_KEY};

/// Resolves (and lazily provisions) the journal spreadsheet.
pub struct StoreLocator {
    store: Arc<dyn TabularStore>,
    cache: Arc<dyn StoreIdCache>,
    title: String,
    /// Serializes resolution within this process so it never creates two stores.
    resolve_lock: Mutex<()>,
}

impl StoreLocator {
    pub fn new(
        store: Arc<dyn TabularStore>,
        cache: Arc<dyn StoreIdCache>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            title: title.into(),
            resolve_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TabularStore> {
        &self.store
    }

    /// Return the store id, finding or creating the spreadsheet if needed.
    ///
    /// Idempotent. With a warm cache no remote call is made.
    pub async fn resolve(&self, caller: &Caller) -> Result<StoreId, AppError> {
        if let Some(id) = self.cache.get(STORE_ID_CACHE_KEY).await {
            return Ok(id);
        }

        let _guard = self.resolve_lock.lock().await;

        // Another request may have resolved while we waited.
        if let Some(id) = self.cache.get(STORE_ID_CACHE_KEY).await {
            return Ok(id);
        }

        let id = match self
            .store
            .find_by_name(&caller.access_token, &self.title)
            .await?
        {
            Some(id) => {
                tracing::info!(store_id = %id, title = %self.title, "Found existing journal spreadsheet");
                id
            }
            None => self.provision(caller).await?,
        };

        self.cache.set(STORE_ID_CACHE_KEY, &id).await?;
        Ok(id)
    }

    async fn provision(&self, caller: &Caller) -> Result<StoreId, AppError> {
        tracing::info!(title = %self.title, email = %caller.email, "Creating journal spreadsheet");

        let id = self
            .store
            .create(&caller.access_token, &self.title, &Region::ALL)
            .await?;

        let headers: Vec<(Region, Row)> = Region::ALL
            .iter()
            .map(|&region| {
                (
                    region,
                    region.header().iter().map(|h| h.to_string()).collect(),
                )
            })
            .collect();
        self.store
            .write_headers(&caller.access_token, &id, &headers)
            .await?;

        ensure_bootstrap_admin(self.store.as_ref(), caller, &id, Utc::now()).await?;

        tracing::info!(store_id = %id, admin = %caller.email, "Journal spreadsheet provisioned");
        Ok(id)
    }
}
