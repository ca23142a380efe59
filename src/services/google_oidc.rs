// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification of the Google ID token returned by the sign-in code exchange.
//!
//! Signing keys come from Google's JWKS, located through OpenID discovery
//! and cached for the `max-age` Google advertises.

use crate::config::Config;
use crate::models::UserProfile;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const DEFAULT_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Google account behind a verified ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    /// Stable Google account id (`sub`)
    pub subject: String,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OidcError {
    /// The token is malformed, badly signed, or carries unexpected claims.
    #[error("ID token rejected: {0}")]
    Rejected(String),
    /// Keys could not be fetched.
    #[error("ID token verification unavailable: {0}")]
    Unavailable(String),
}

enum KeySource {
    Google,
    Static {
        kid: String,
        key: Arc<DecodingKey>,
    },
}

struct CachedKeys {
    jwks_uri: Option<String>,
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

pub struct GoogleOidcVerifier {
    http: reqwest::Client,
    client_id: String,
    source: KeySource,
    keys: RwLock<Option<CachedKeys>>,
    refresh_lock: Mutex<()>,
}

impl GoogleOidcVerifier {
    /// Verifier for tokens issued to our OAuth client, with keys from Google.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::build(config, KeySource::Google)
    }

    /// Verifier that trusts a single fixed RSA key (local runs and tests).
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key id must not be empty");
        }
        Self::build(
            config,
            KeySource::Static {
                kid,
                key: Arc::new(key),
            },
        )
    }

    fn build(config: &Config, source: KeySource) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building ID token HTTP client")?;

        tracing::info!(client_id = %config.google_client_id, "Initialized Google ID token verifier");

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            source,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify signature, issuer, audience and expiry; require a verified email.
    pub async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, OidcError> {
        let header = decode_header(id_token)
            .map_err(|e| OidcError::Rejected(format!("invalid JWT header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(OidcError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| OidcError::Rejected("missing JWT kid".to_string()))?;

        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IdTokenClaims>(id_token, key.as_ref(), &validation)
            .map_err(|e| OidcError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        check_issued_at(claims.iat)?;
        let identity = claims.into_identity()?;

        tracing::debug!(subject = %identity.subject, email = %identity.profile.email, "ID token verified");
        Ok(identity)
    }

    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        if let KeySource::Static { kid: known, key } = &self.source {
            return if kid == known {
                Ok(key.clone())
            } else {
                Err(OidcError::Rejected(format!("unknown JWT kid: {kid}")))
            };
        }

        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; a miss after a normal refresh gets one forced refetch.
        for force in [false, true] {
            self.refresh_keys(force).await?;
            if let Some(key) = self.cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(OidcError::Rejected(format!("JWT kid not in JWKS: {kid}")))
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now())
            .and_then(|cached| cached.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_keys(&self, force: bool) -> Result<(), OidcError> {
        let _guard = self.refresh_lock.lock().await;

        let previous_uri = {
            let cached = self.keys.read().await;
            if !force
                && cached
                    .as_ref()
                    .is_some_and(|c| c.expires_at > Instant::now())
            {
                return Ok(());
            }
            cached.as_ref().and_then(|c| c.jwks_uri.clone())
        };

        let jwks_uri = self.discover_jwks_uri(previous_uri).await;
        tracing::debug!(jwks_uri = %jwks_uri, "Refreshing Google signing keys");

        let response = self
            .http
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| OidcError::Unavailable(format!("JWKS request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(OidcError::Unavailable(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = max_age(response.headers()).unwrap_or(DEFAULT_CACHE_TTL);
        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| OidcError::Unavailable(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid: HashMap<String, Arc<DecodingKey>> = jwks
            .keys
            .into_iter()
            .filter(Jwk::is_rs256_signing_key)
            .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => Some((jwk.kid, Arc::new(key))),
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA key");
                    None
                }
            })
            .collect();

        if keys_by_kid.is_empty() {
            return Err(OidcError::Unavailable(
                "JWKS response had no usable RSA keys".to_string(),
            ));
        }

        *self.keys.write().await = Some(CachedKeys {
            jwks_uri: Some(jwks_uri),
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    /// JWKS location from discovery, falling back to the last known or default URI.
    async fn discover_jwks_uri(&self, previous: Option<String>) -> String {
        let fallback = || previous.clone().unwrap_or_else(|| DEFAULT_JWKS_URL.to_string());

        match self.http.get(DISCOVERY_URL).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<OpenIdConfig>().await {
                Ok(config) => config.jwks_uri,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid OIDC discovery document; using fallback JWKS URI");
                    fallback()
                }
            },
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "OIDC discovery failed; using fallback JWKS URI");
                fallback()
            }
            Err(e) => {
                tracing::warn!(error = %e, "OIDC discovery request failed; using fallback JWKS URI");
                fallback()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenIdConfig {
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

impl Jwk {
    fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && !self.kid.trim().is_empty()
            && self.alg.as_deref().is_none_or(|alg| alg == "RS256")
            && self.use_.as_deref().is_none_or(|u| u == "sig")
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: Option<u64>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl IdTokenClaims {
    fn into_identity(self) -> Result<VerifiedIdentity, OidcError> {
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| OidcError::Rejected("missing email claim".to_string()))?;

        if self.email_verified != Some(true) {
            return Err(OidcError::Rejected("email is not verified".to_string()));
        }

        Ok(VerifiedIdentity {
            subject: self.sub,
            profile: UserProfile {
                name: self.name.unwrap_or_else(|| email.clone()),
                email,
                avatar_url: self.picture,
            },
        })
    }
}

fn check_issued_at(iat: Option<u64>) -> Result<(), OidcError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    match iat {
        None => Err(OidcError::Rejected("missing iat claim".to_string())),
        Some(iat) if iat > now + CLOCK_SKEW_SECS => {
            Err(OidcError::Rejected("iat claim is in the future".to_string()))
        }
        Some(_) => Ok(()),
    }
}

fn max_age(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_max_age)
        .map(Duration::from_secs)
}

fn parse_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse().ok())
}
