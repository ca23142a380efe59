// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod dashboard;
pub mod google_oauth;
pub mod google_oidc;
pub mod locator;
pub mod reader;
pub mod session;
pub mod writer;

pub use access::{ensure_bootstrap_admin, AccessGate, Bootstrap};
pub use dashboard::{DashboardView, MetricPoint};
pub use google_oauth::{GoogleOAuthClient, GoogleTokens};
pub use google_oidc::{GoogleOidcVerifier, OidcError, VerifiedIdentity};
pub use locator::StoreLocator;
pub use reader::RecordReader;
pub use session::{Session, SessionStore};
pub use writer::{AppendStatus, KindOutcome, RecordWriter, SubmissionOutcome};

/// Identity and credential of the signed-in user, passed to every storage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub email: String,
    pub access_token: String,
}

impl Caller {
    pub fn new(email: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            access_token: access_token.into(),
        }
    }
}
