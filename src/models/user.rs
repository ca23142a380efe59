//! Signed-in user profile and allow-list model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile of the signed-in Google user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Display name
    pub name: String,
    /// Verified email address
    pub email: String,
    /// Profile picture URL
    pub avatar_url: Option<String>,
}

/// A row of the allow-list region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowListEntry {
    pub email: String,
    /// When the entry was added (RFC3339)
    pub date_added: String,
}

impl AllowListEntry {
    pub fn to_row(&self) -> Vec<String> {
        vec![self.email.clone(), self.date_added.clone()]
    }

    /// Case-insensitive email match.
    pub fn matches(listed: &str, email: &str) -> bool {
        listed.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// Outcome of the allow-list check for a signed-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AccessStatus {
    /// Signed in, check not finished yet
    Checking,
    Granted,
    Denied,
}
