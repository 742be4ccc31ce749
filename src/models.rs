//! Data models and structures
//!
//! Defines the cache records, the Images API payloads and the
//! environment-driven configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_VARIANT: &str = "/public";
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DELIVERY_BASE_URL: &str = "https://imagedelivery.net";

/// One uploaded piece of content, keyed by its digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub digest: String,
    pub remote_url: String,
    pub original_file_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// An image held by the hosting service.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteAsset {
    pub id: String,
    /// `None` when the listing carried no parseable timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub uploaded: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub meta: Option<AssetMeta>,
}

impl RemoteAsset {
    /// Original file name recorded in the asset metadata, if any.
    pub fn original_name(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.file_name.as_deref())
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AssetMeta {
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
}

// Images API response envelopes
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedImage {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageList {
    #[serde(default)]
    pub images: Vec<RemoteAsset>,
}

/// Account id and token: everything the list/delete calls need.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub account_id: String,
    pub api_token: String,
}

impl ApiCredentials {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            account_id: required(&lookup, "CF_ACCOUNT_ID")?,
            api_token: required(&lookup, "CF_API_TOKEN")?,
        })
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: ApiCredentials,
    pub account_hash: String,
    pub default_variant: String,
    pub api_base_url: String,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Missing account id, token or
    /// account hash is a [`crate::Error::Config`].
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            credentials: ApiCredentials::from_lookup(&lookup)?,
            account_hash: required(&lookup, "CF_ACCOUNT_HASH")?,
            default_variant: non_empty(&lookup, "CF_DEFAULT_VARIANT")
                .unwrap_or_else(|| DEFAULT_VARIANT.to_string()),
            api_base_url: non_empty(&lookup, "CF_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> crate::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).ok_or_else(|| crate::Error::Config(format!("{} not set", key)))
}
