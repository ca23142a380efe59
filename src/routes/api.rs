// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::require_access;
use crate::models::{AccessStatus, JournalEntry};
use crate::services::{DashboardView, SubmissionOutcome};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require a session; journal routes also require access).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    let journal = Router::new()
        .route("/api/journal", get(get_journal).post(post_journal))
        .route_layer(middleware::from_fn(require_access));

    Router::new().route("/api/me", get(get_me)).merge(journal)
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub access: AccessStatus,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let session = state
        .sessions
        .get(&user.subject)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserResponse {
        name: session.profile.name,
        email: session.profile.email,
        avatar_url: session.profile.avatar_url,
        access: session.access,
    }))
}

// ─── Journal ─────────────────────────────────────────────────

/// Dashboard data. Read failures show up as empty data, not an error.
async fn get_journal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardView>> {
    let caller = state.sessions.caller(&user.subject).await?;
    let data = state.reader.fetch_all(&caller).await;
    Ok(Json(DashboardView::from_data(data)))
}

/// Journal submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// `ok`, `partial` or `failed`
    pub status: &'static str,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
}

/// Save one journal entry.
///
/// 200 when nothing failed. When any kind failed the response is 502 and
/// still lists what was written, since completed appends are not undone.
async fn post_journal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<JournalEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let Json(entry) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    entry
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let caller = state.sessions.caller(&user.subject).await?;
    let outcome = state.writer.submit(&caller, &entry).await;

    let status = if outcome.any_failed() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(SubmitResponse {
            status: outcome.status(),
            outcome,
        }),
    ))
}
