// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in routes.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, request_subject, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::AccessStatus;
use crate::routes::is_trusted_frontend;
use crate::services::{Caller, OidcError, Session, SessionStore};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", get(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to return to after sign-in; defaults to `FRONTEND_URL`.
    /// Only the configured frontend's origin and localhost are honored.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start sign-in: redirect to the Google consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let configured = &state.config.frontend_url;
    let frontend_url = match params.redirect_uri {
        Some(uri) if is_trusted_frontend(&uri, configured) => uri,
        Some(uri) => {
            tracing::warn!(redirect_uri = %uri, "Ignoring untrusted redirect_uri");
            configured.clone()
        }
        None => configured.clone(),
    };

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let oauth_state = sign_state(&frontend_url, timestamp, &state.config.oauth_state_key)?;

    tracing::info!(frontend_url = %frontend_url, "Starting sign-in, redirecting to Google");
    Ok(Redirect::temporary(
        &state.oauth.authorize_url(&oauth_state),
    ))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: exchange the code, verify identity, check access, start a session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let configured = &state.config.frontend_url;
    let frontend_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key)
        .filter(|url| is_trusted_frontend(url, configured))
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid, tampered or untrusted state parameter, falling back to default frontend URL"
            );
            configured.clone()
        });

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    let tokens = state.oauth.exchange_code(&code).await?;
    let id_token = tokens
        .id_token
        .as_deref()
        .ok_or_else(|| AppError::GoogleApi("token response has no id_token".to_string()))?;

    let identity = state.verifier.verify(id_token).await.map_err(|e| {
        tracing::warn!(error = %e, "ID token verification failed");
        match e {
            OidcError::Rejected(_) => AppError::InvalidToken,
            OidcError::Unavailable(msg) => AppError::GoogleApi(msg),
        }
    })?;

    let subject = identity.subject.clone();
    let session = Session::new(identity, &tokens, chrono::Utc::now());
    let caller = Caller::new(session.profile.email.clone(), tokens.access_token.clone());
    state.sessions.insert(session);

    let granted = state.access_gate.check_access(&caller).await;
    let access = if granted {
        AccessStatus::Granted
    } else {
        AccessStatus::Denied
    };
    state.sessions.set_access(&subject, access);

    tracing::info!(subject = %subject, email = %caller.email, access = ?access, "Sign-in complete");

    let jwt = create_jwt(&subject, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let jar = jar.add(session_cookie(jwt.clone(), &frontend_url));
    let redirect_url = format!("{}/callback?token={}", frontend_url, jwt);
    Ok((jar, Redirect::temporary(&redirect_url)))
}

/// Sign out: drop the session, revoke the Google grant, clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Redirect) {
    let session = request_subject(&jar, &headers, &state.config.jwt_signing_key)
        .and_then(|subject| state.sessions.remove(&subject));

    if let Some(session) = session {
        // Best effort; the local session is already gone.
        if let Err(e) = state
            .oauth
            .revoke(SessionStore::revocable_token(&session))
            .await
        {
            tracing::warn!(error = %e, subject = %session.subject, "Failed to revoke Google token");
        }
        tracing::info!(subject = %session.subject, "Signed out");
    }

    let jar = jar.remove(removal_cookie(&state.config.frontend_url));
    (jar, Redirect::temporary(&state.config.frontend_url))
}

fn is_secure(frontend_url: &str) -> bool {
    frontend_url.starts_with("https://")
}

fn session_cookie(jwt: String, frontend_url: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure(frontend_url))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn removal_cookie(frontend_url: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure(frontend_url))
        .build()
}

/// Encode `frontend_url|timestamp_hex|signature_hex`, URL-safe base64.
fn sign_state(frontend_url: &str, timestamp_millis: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", frontend_url, timestamp_millis);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the HMAC signature and return the frontend URL from the OAuth state.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // The URL itself may contain '|', so split from the right.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}|{}", frontend_url, timestamp_hex).as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(signature_hex.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}
