// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in sessions and their Google credentials.
//!
//! Sessions are kept in memory, keyed by Google subject, and are lost on
//! restart (users sign in again). A session outlives its session token
//! only until the next sign-in prunes it. Access tokens are refreshed shortly
//! before they expire; refreshes for one user are serialized.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::middleware::auth::SESSION_TTL_SECS;
use crate::models::{AccessStatus, UserProfile};
use crate::services::google_oauth::{GoogleOAuthClient, GoogleTokens};
use crate::services::google_oidc::VerifiedIdentity;
use crate::services::Caller;

/// Refresh when the access token has less than this left (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// One signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject: String,
    pub profile: UserProfile,
    pub access: AccessStatus,
    signed_in_at: DateTime<Utc>,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// New session after sign-in; access is still being checked.
    pub fn new(identity: VerifiedIdentity, tokens: &GoogleTokens, now: DateTime<Utc>) -> Self {
        Self {
            subject: identity.subject,
            profile: identity.profile,
            access: AccessStatus::Checking,
            signed_in_at: now,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at(now),
        }
    }

    /// Session with explicit credentials, bypassing the OAuth flow.
    pub fn with_credentials(
        subject: impl Into<String>,
        profile: UserProfile,
        access: AccessStatus,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            profile,
            access,
            signed_in_at: Utc::now(),
            access_token: access_token.into(),
            refresh_token,
            expires_at,
        }
    }

    fn token_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }

    /// Past the lifetime of any session token issued at sign-in.
    fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.signed_in_at >= Duration::seconds(SESSION_TTL_SECS as i64)
    }

    fn caller(&self) -> Caller {
        Caller::new(self.profile.email.clone(), self.access_token.clone())
    }
}

/// In-memory session table with per-user token refresh.
pub struct SessionStore {
    oauth: GoogleOAuthClient,
    sessions: DashMap<String, Session>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionStore {
    pub fn new(oauth: GoogleOAuthClient) -> Self {
        Self {
            oauth,
            sessions: DashMap::new(),
            refresh_locks: DashMap::new(),
        }
    }

    /// Add a signed-in session, replacing any earlier one for the subject.
    pub fn insert(&self, session: Session) {
        self.prune_expired(Utc::now());
        self.sessions.insert(session.subject.clone(), session);
    }

    /// Drop sessions whose session token can no longer be valid.
    fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.expired(now));
        self.refresh_locks
            .retain(|subject, _| self.sessions.contains_key(subject));

        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            tracing::info!(pruned, "Expired sessions removed");
        }
        pruned
    }

    pub fn get(&self, subject: &str) -> Option<Session> {
        self.sessions.get(subject).map(|s| s.clone())
    }

    /// Drop the session (sign-out). Returns it so tokens can be revoked.
    pub fn remove(&self, subject: &str) -> Option<Session> {
        self.refresh_locks.remove(subject);
        self.sessions.remove(subject).map(|(_, s)| s)
    }

    /// Record the access check result. False if the session is gone.
    pub fn set_access(&self, subject: &str, access: AccessStatus) -> bool {
        match self.sessions.get_mut(subject) {
            Some(mut session) => {
                session.access = access;
                true
            }
            None => false,
        }
    }

    /// Token that revokes the grant at sign-out (refresh token if we have one).
    pub fn revocable_token(session: &Session) -> &str {
        session
            .refresh_token
            .as_deref()
            .unwrap_or(&session.access_token)
    }

    /// Email and a currently valid access token for `subject`.
    ///
    /// 1. Fresh token in the session: return it (no I/O)
    /// 2. Take the per-user lock and check again
    /// 3. Refresh with Google; a rejected refresh token ends the session
    pub async fn caller(&self, subject: &str) -> Result<Caller, AppError> {
        let now = Utc::now();

        let expired = match self.sessions.get(subject) {
            Some(session) if session.expired(now) => true,
            Some(session) if session.token_fresh(now) => return Ok(session.caller()),
            Some(_) => false,
            None => return Err(AppError::Unauthorized),
        };
        if expired {
            tracing::info!(subject, "Session past its lifetime, session ended");
            self.remove(subject);
            return Err(AppError::Unauthorized);
        }

        let lock = self
            .refresh_locks
            .entry(subject.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let refresh_token = match self.sessions.get(subject) {
            Some(session) if session.token_fresh(now) => return Ok(session.caller()),
            Some(session) => session.refresh_token.clone(),
            None => return Err(AppError::Unauthorized),
        };

        let Some(refresh_token) = refresh_token else {
            tracing::info!(subject, "Access token expired and no refresh token, session ended");
            self.remove(subject);
            return Err(AppError::Unauthorized);
        };

        tracing::info!(subject, "Access token expiring, refreshing");
        let tokens = match self.oauth.refresh_token(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) if e.is_google_token_error() => {
                tracing::warn!(subject, error = %e, "Refresh token rejected, session ended");
                self.remove(subject);
                return Err(AppError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        let mut session = self
            .sessions
            .get_mut(subject)
            .ok_or(AppError::Unauthorized)?;
        session.access_token = tokens.access_token.clone();
        session.expires_at = tokens.expires_at(Utc::now());
        if let Some(rotated) = tokens.refresh_token {
            session.refresh_token = Some(rotated);
        }

        tracing::info!(subject, "Access token refreshed");
        Ok(session.caller())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Test User".to_string(),
            email: "user@example.com".to_string(),
            avatar_url: None,
        }
    }

    fn store_against(server: &MockServer) -> SessionStore {
        SessionStore::new(GoogleOAuthClient::with_endpoints(
            &Config::test_default(),
            "http://unused",
            &server.url("/token"),
            &server.url("/revoke"),
        ))
    }

    fn expiring_session(refresh: Option<&str>) -> Session {
        Session::with_credentials(
            "sub-1",
            profile(),
            AccessStatus::Granted,
            "old-token",
            refresh.map(str::to_string),
            Utc::now() + Duration::seconds(30),
        )
    }

    #[tokio::test]
    async fn fresh_token_is_returned_without_refresh() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/token");
                then.status(500);
            })
            .await;
        let store = store_against(&server);
        store.insert(Session::with_credentials(
            "sub-1",
            profile(),
            AccessStatus::Granted,
            "live-token",
            None,
            Utc::now() + Duration::hours(1),
        ));

        let caller = store.caller("sub-1").await.unwrap();
        assert_eq!(caller, Caller::new("user@example.com", "live-token"));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn concurrent_callers_refresh_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=refresh_token");
                then.status(200).json_body(serde_json::json!({
                    "access_token": "new-token",
                    "expires_in": 3600
                }));
            })
            .await;
        let store = Arc::new(store_against(&server));
        store.insert(expiring_session(Some("refresh-1")));

        let mut handles = vec![];
        for _ in 0..5 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.caller("sub-1").await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().access_token, "new-token");
        }
        mock.assert_hits_async(1).await;

        let session = store.get("sub-1").unwrap();
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn rejected_refresh_ends_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/token");
                then.status(400)
                    .json_body(serde_json::json!({"error": "invalid_grant"}));
            })
            .await;
        let store = store_against(&server);
        store.insert(expiring_session(Some("revoked")));

        assert!(matches!(
            store.caller("sub-1").await,
            Err(AppError::Unauthorized)
        ));
        assert!(store.get("sub-1").is_none());
    }

    #[tokio::test]
    async fn expired_without_refresh_token_is_unauthorized() {
        let server = MockServer::start_async().await;
        let store = store_against(&server);
        store.insert(expiring_session(None));

        assert!(matches!(
            store.caller("sub-1").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            store.caller("nobody").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn sign_in_prunes_sessions_past_their_lifetime() {
        let store = SessionStore::new(GoogleOAuthClient::new(&Config::test_default()));
        let mut stale = expiring_session(None);
        stale.subject = "stale".to_string();
        stale.access = AccessStatus::Denied;
        stale.signed_in_at = Utc::now() - Duration::seconds(SESSION_TTL_SECS as i64 + 60);
        store.sessions.insert(stale.subject.clone(), stale);
        store
            .refresh_locks
            .insert("stale".to_string(), Arc::new(Mutex::new(())));

        store.insert(expiring_session(None));

        assert_eq!(store.sessions.len(), 1);
        assert!(store.get("stale").is_none());
        assert!(store.get("sub-1").is_some());
        assert!(store.refresh_locks.is_empty());
        assert_eq!(store.prune_expired(Utc::now()), 0);
    }

    #[tokio::test]
    async fn session_past_its_lifetime_is_unauthorized() {
        let server = MockServer::start_async().await;
        let store = store_against(&server);
        let mut old = Session::with_credentials(
            "sub-1",
            profile(),
            AccessStatus::Granted,
            "live-token",
            None,
            Utc::now() + Duration::hours(1),
        );
        old.signed_in_at = Utc::now() - Duration::days(31);
        store.sessions.insert(old.subject.clone(), old);

        assert!(matches!(
            store.caller("sub-1").await,
            Err(AppError::Unauthorized)
        ));
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn set_access_updates_existing_sessions_only() {
        let store = SessionStore::new(GoogleOAuthClient::new(&Config::test_default()));
        store.insert(expiring_session(None));

        assert!(store.set_access("sub-1", AccessStatus::Denied));
        assert_eq!(store.get("sub-1").unwrap().access, AccessStatus::Denied);
        assert!(!store.set_access("missing", AccessStatus::Granted));
    }
}
