// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 client for user sign-in.
//!
//! Handles:
//! - Consent URL construction (offline access, Sheets + Drive scopes)
//! - Authorization code exchange
//! - Access token refresh
//! - Token revocation on sign-out

use crate::config::Config;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Scopes requested at sign-in: identity plus access to the journal spreadsheet.
pub const SCOPES: &str = "openid email profile \
    https://www.googleapis.com/auth/spreadsheets \
    https://www.googleapis.com/auth/drive.file";

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
    revoke_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoints(config, AUTH_URL, TOKEN_URL, REVOKE_URL)
    }

    /// Client with non-default endpoints (mock server in tests).
    pub fn with_endpoints(config: &Config, auth_url: &str, token_url: &str, revoke_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: auth_url.to_string(),
            token_url: token_url.to_string(),
            revoke_url: revoke_url.to_string(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.oauth_callback_url(),
        }
    }

    /// Consent screen URL carrying the signed `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&include_granted_scopes=true&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for tokens (including the ID token).
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::GoogleApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let tokens: GoogleTokens = response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Failed to parse token response: {}", e)))?;
        Ok(tokens)
    }

    /// Get a new access token. Google does not rotate the refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokens, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // 400 invalid_grant: refresh token revoked or expired
            return Err(AppError::GoogleApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("JSON parse error: {}", e)))
    }

    /// Revoke a token at Google. Revoking either token ends the grant.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(&self.revoke_url)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Revocation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GoogleApi(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!("Google token revoked");
        Ok(())
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    /// Seconds until `access_token` expires
    pub expires_in: i64,
    /// Only on the first consent (or with `prompt=consent`)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Only on code exchange
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl GoogleTokens {
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.expires_in)
    }
}
