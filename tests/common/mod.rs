// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Duration, Utc};
use gym_journal::config::Config;
use gym_journal::models::{AccessStatus, Row, UserProfile};
use gym_journal::routes::create_router;
use gym_journal::services::{
    Caller, GoogleOAuthClient, GoogleOidcVerifier, Session, StoreLocator,
};
use gym_journal::store::{InMemoryStore, MemoryStoreIdCache};
use gym_journal::AppState;
use std::sync::Arc;

/// Google subject used by the default signed-in test user.
#[allow(dead_code)]
pub const TEST_SUBJECT: &str = "109876543210";

#[allow(dead_code)]
pub const TEST_EMAIL: &str = "owner@example.com";

#[allow(dead_code)]
pub fn caller(email: &str) -> Caller {
    Caller::new(email, "test-access-token")
}

/// Row literal helper.
#[allow(dead_code)]
pub fn row(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Locator over a fresh in-memory store with a cold cache.
#[allow(dead_code)]
pub fn test_locator() -> (Arc<StoreLocator>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let locator = Arc::new(StoreLocator::new(
        store.clone(),
        Arc::new(MemoryStoreIdCache::new()),
        "GymJournalData",
    ));
    (locator, store)
}

/// Create a test app over the in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<InMemoryStore>) {
    create_test_app_with_frontend_url("http://localhost:5173")
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(
    frontend_url: &str,
) -> (axum::Router, Arc<AppState>, Arc<InMemoryStore>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();

    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(
        AppState::new(config, store.clone(), Arc::new(MemoryStoreIdCache::new()))
            .expect("Failed to build test state"),
    );

    (create_router(state.clone()), state, store)
}

/// Test app whose Google OAuth endpoints live on `google_base_url` (a mock server).
#[allow(dead_code)]
pub fn create_test_app_with_google(
    google_base_url: &str,
) -> (axum::Router, Arc<AppState>, Arc<InMemoryStore>) {
    let config = Config::test_default();
    let oauth = GoogleOAuthClient::with_endpoints(
        &config,
        &format!("{google_base_url}/o/oauth2/v2/auth"),
        &format!("{google_base_url}/token"),
        &format!("{google_base_url}/revoke"),
    );
    let verifier = GoogleOidcVerifier::new(&config).expect("Failed to build verifier");

    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(AppState::with_identity(
        config,
        store.clone(),
        Arc::new(MemoryStoreIdCache::new()),
        oauth,
        verifier,
    ));

    (create_router(state.clone()), state, store)
}

/// Create a session JWT the way the auth routes do.
#[allow(dead_code)]
pub fn create_test_jwt(subject: &str, signing_key: &[u8]) -> String {
    gym_journal::middleware::auth::create_jwt(subject, signing_key)
        .expect("Failed to create JWT")
}

/// Insert a live session for `subject` and return its session JWT.
#[allow(dead_code)]
pub fn sign_in(state: &AppState, subject: &str, email: &str, access: AccessStatus) -> String {
    state.sessions.insert(Session::with_credentials(
        subject,
        UserProfile {
            name: "Test Lifter".to_string(),
            email: email.to_string(),
            avatar_url: Some("https://example.com/avatar.png".to_string()),
        },
        access,
        "test-access-token",
        None,
        Utc::now() + Duration::hours(1),
    ));
    create_test_jwt(subject, &state.config.jwt_signing_key)
}
