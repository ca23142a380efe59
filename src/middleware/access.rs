// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal access enforcement. Must run after `require_auth`.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::AccessStatus;
use axum::{extract::Request, middleware::Next, response::Response};

/// Only sessions whose allow-list check came back granted get through.
/// A check still in progress counts as denied.
pub async fn require_access(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if user.access != AccessStatus::Granted {
        tracing::info!(email = %user.email, access = ?user.access, "Journal access denied");
        return Err(AppError::AccessDenied(user.email.clone()));
    }

    Ok(next.run(request).await)
}
