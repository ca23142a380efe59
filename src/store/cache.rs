// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value slot remembering the backing spreadsheet id.
//!
//! The cached id is trusted as-is; it is never re-validated against Drive.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::StoreId;

/// Fixed logical key under which the store id is cached.
pub const STORE_ID_CACHE_KEY: &str = "gymJournalSheetId";

/// Persistent slot for the resolved store id, injected into the locator.
#[async_trait]
pub trait StoreIdCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<StoreId>;
    async fn set(&self, key: &str, id: &StoreId) -> Result<(), AppError>;
}

/// Cache kept in process memory.
#[derive(Default)]
pub struct MemoryStoreIdCache {
    entries: Mutex<HashMap<String, StoreId>>,
}

impl MemoryStoreIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with one id under the standard key.
    pub fn warm(id: StoreId) -> Self {
        let cache = Self::default();
        cache
            .entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(STORE_ID_CACHE_KEY.to_string(), id);
        cache
    }
}

#[async_trait]
impl StoreIdCache for MemoryStoreIdCache {
    async fn get(&self, key: &str) -> Option<StoreId> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    async fn set(&self, key: &str, id: &StoreId) -> Result<(), AppError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), id.clone());
        Ok(())
    }
}

/// Cache persisted as a small JSON object on disk.
///
/// A missing file is an empty cache. An unreadable or corrupt file is also
/// treated as empty (with a warning) and gets overwritten on the next `set`.
pub struct FileStoreIdCache {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStoreIdCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn load(&self) -> HashMap<String, StoreId> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read store cache");
                return HashMap::new();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt store cache");
            HashMap::new()
        })
    }
}

#[async_trait]
impl StoreIdCache for FileStoreIdCache {
    async fn get(&self, key: &str) -> Option<StoreId> {
        self.load().await.remove(key)
    }

    async fn set(&self, key: &str, id: &StoreId) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        entries.insert(key.to_string(), id.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let body = serde_json::to_vec_pretty(&entries)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode cache: {}", e)))?;
        tokio::fs::write(&self.path, body).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write store cache {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), key, store_id = %id, "Store id cached");
        Ok(())
    }
}
