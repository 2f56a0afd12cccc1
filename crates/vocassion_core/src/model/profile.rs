//! Profile model: one per authenticated user.
//!
//! # Invariants
//! - `user_id` is the opaque id handed over by the auth provider and unique.
//! - `username` and `slug` are lowercase, URL-safe and unique.

use super::{require_text, ValidationError};
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a profile. Every progression record hangs off it.
pub type ProfileId = Uuid;

const USERNAME_SUFFIX_LEN: usize = 6;

static USERNAME_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]+").expect("valid username regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: String,
    pub username: String,
    pub slug: String,
    pub name: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create request for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProfile {
    /// Returns the trimmed display name.
    pub fn validate(&self) -> Result<String, ValidationError> {
        require_text("name", &self.name)
    }
}

/// Derives a username from a display name plus a random suffix.
///
/// `"Ada Lovelace"` becomes `adalovelace` followed by six lowercase
/// alphanumerics.
pub fn generate_username(name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(USERNAME_SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    username_with_suffix(name, &suffix)
}

/// Deterministic half of [`generate_username`].
pub fn username_with_suffix(name: &str, suffix: &str) -> String {
    let lowered = name.to_lowercase();
    let base = USERNAME_STRIP_RE.replace_all(&lowered, "");
    let base = if base.is_empty() { "user" } else { base.as_ref() };
    format!("{base}{suffix}")
}
