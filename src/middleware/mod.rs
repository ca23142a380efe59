// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, access, security).

pub mod access;
pub mod auth;
pub mod security;

pub use access::require_access;
pub use auth::require_auth;
