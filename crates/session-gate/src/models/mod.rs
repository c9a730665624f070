//! Data models for Session Gate.
//!
//! Wire types use camelCase to match the identity backend's JSON.

use common::types::UserId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// User & Session
// ============================================================================

/// Signed-in user as returned by `GET /users/me`.
///
/// Only `id` and `is_admin` take part in navigation decisions; the rest is
/// passed through to page data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub first_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    #[serde(default)]
    pub disabled: bool,
}

/// Who is calling and what the effective application configuration is.
///
/// Built once per navigation by the bootstrap loader and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// `None` means the caller is not signed in.
    pub user: Option<User>,

    /// `None` means the configuration fetch failed.
    pub app_config: Option<AppConfigMap>,
}

impl Session {
    /// Session of a caller that is not signed in and has no configuration.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

// ============================================================================
// Application configuration
// ============================================================================

/// Raw configuration triple as returned by `GET /application-configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfigEntry {
    pub key: String,

    #[serde(rename = "type")]
    pub value_type: String,

    pub value: String,
}

/// Configuration value with its type inferred from the raw string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

static NUMERIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").ok());

impl ConfigValue {
    /// Infer the value type from its raw string form.
    ///
    /// `"true"`/`"false"` become booleans, plain decimal numbers become
    /// numbers, everything else stays text. Matching is case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return ConfigValue::Bool(true),
            "false" => return ConfigValue::Bool(false),
            _ => {}
        }

        let numeric = NUMERIC.as_ref().is_some_and(|re| re.is_match(raw));
        if numeric {
            if let Ok(number) = raw.parse::<f64>() {
                return ConfigValue::Number(number);
            }
        }

        ConfigValue::Text(raw.to_string())
    }
}

/// Typed key → value view of the application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AppConfigMap(BTreeMap<String, ConfigValue>);

impl AppConfigMap {
    /// Build the map from the backend's raw triples. Later duplicates win.
    pub fn from_entries(entries: Vec<AppConfigEntry>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|entry| {
                    let value = ConfigValue::parse(&entry.value);
                    (entry.key, value)
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(ConfigValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(ConfigValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(ConfigValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Version freshness
// ============================================================================

/// Persisted record of the newest released version.
///
/// Stored as JSON under the `version_cache` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCacheEntry {
    /// Newest released version, already stripped of its tag prefix.
    pub newest_version: String,

    /// When the entry was fetched, in milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Running version at the time the entry was written.
    pub last_current_version: String,
}

impl VersionCacheEntry {
    /// True once more than `ttl` has elapsed since the entry was written.
    pub fn is_expired(&self, now_millis: i64, ttl: Duration) -> bool {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.timestamp) > ttl_millis
    }

    /// True if the entry was written by the build that is running now.
    pub fn matches_build(&self, current_version: &str) -> bool {
        self.last_current_version == current_version
    }

    /// An entry may be trusted only if it is neither expired nor stale
    /// with respect to the running build.
    pub fn is_valid(&self, now_millis: i64, ttl: Duration, current_version: &str) -> bool {
        !self.is_expired(now_millis, ttl) && self.matches_build(current_version)
    }
}

/// Version block shown in the settings area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInformation {
    pub current_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_up_to_date: Option<bool>,
}

// ============================================================================
// Page data
// ============================================================================

/// Data handed to the page renderer for an allowed navigation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub user: Option<User>,

    pub app_config: Option<AppConfigMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_information: Option<VersionInformation>,
}
