// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym Journal: a workout, body-metrics and notes journal kept in a Google Sheet.
//!
//! This crate provides the backend API. Users sign in with Google; their
//! own access token is used for every spreadsheet call, and an allow-list
//! tab inside the spreadsheet decides who may use the journal.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use std::sync::Arc;

use config::{Config, StorageBackend};
use services::{
    AccessGate, GoogleOAuthClient, GoogleOidcVerifier, RecordReader, RecordWriter, SessionStore,
    StoreLocator,
};
use store::{
    FileStoreIdCache, GoogleSheetsStore, InMemoryStore, MemoryStoreIdCache, StoreIdCache,
    TabularStore,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub oauth: GoogleOAuthClient,
    pub verifier: GoogleOidcVerifier,
    pub sessions: SessionStore,
    pub locator: Arc<StoreLocator>,
    pub access_gate: AccessGate,
    pub writer: RecordWriter,
    pub reader: RecordReader,
}

impl AppState {
    /// Wire up services over the given storage backend and id cache.
    pub fn new(
        config: Config,
        store: Arc<dyn TabularStore>,
        cache: Arc<dyn StoreIdCache>,
    ) -> anyhow::Result<Self> {
        let oauth = GoogleOAuthClient::new(&config);
        let verifier = GoogleOidcVerifier::new(&config)?;
        Ok(Self::with_identity(config, store, cache, oauth, verifier))
    }

    /// Like [`AppState::new`] with explicit identity provider clients.
    pub fn with_identity(
        config: Config,
        store: Arc<dyn TabularStore>,
        cache: Arc<dyn StoreIdCache>,
        oauth: GoogleOAuthClient,
        verifier: GoogleOidcVerifier,
    ) -> Self {
        let locator = Arc::new(StoreLocator::new(
            store,
            cache,
            config.spreadsheet_title.clone(),
        ));

        Self {
            sessions: SessionStore::new(oauth.clone()),
            access_gate: AccessGate::new(locator.clone()),
            writer: RecordWriter::new(locator.clone()),
            reader: RecordReader::new(locator.clone()),
            locator,
            oauth,
            verifier,
            config,
        }
    }

    /// State for the configured storage backend.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let (store, cache): (Arc<dyn TabularStore>, Arc<dyn StoreIdCache>) =
            match config.storage_backend {
                StorageBackend::Sheets => (
                    Arc::new(GoogleSheetsStore::new()),
                    Arc::new(FileStoreIdCache::new(config.store_cache_path.clone())),
                ),
                // Ids of an in-memory store mean nothing after a restart.
                StorageBackend::Memory => (
                    Arc::new(InMemoryStore::new()),
                    Arc::new(MemoryStoreIdCache::new()),
                ),
            };

        tracing::info!(backend = ?config.storage_backend, title = %config.spreadsheet_title, "Storage backend selected");
        Self::new(config, store, cache)
    }
}
