//! Cache-first upload session.
//!
//! An [`Uploader`] owns the dedup cache for the lifetime of one session:
//! the cache is loaded and pruned when the session starts, consulted before
//! every upload and written back after every new one.

use crate::cache::{ImageCache, StateStore, CACHE_MAX_AGE_DAYS};
use crate::format::DocumentKind;
use crate::hash::content_digest;
use crate::images::{CloudflareImagesClient, ImageHostService};
use crate::models::Config;
use crate::{Error, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::Duration;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of uploading (or reusing) one image.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub url: String,
    pub file_name: String,
    /// True when the URL came from the cache and nothing was uploaded.
    pub duplicate: bool,
}

/// Outcome of a multi-file upload.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Formatted snippets for every image that produced a URL, in input order.
    pub links: Vec<String>,
    pub duplicates: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchReport {
    /// "2 duplicate images detected - reused existing URLs", or `None`.
    pub fn duplicate_message(&self) -> Option<String> {
        match self.duplicates {
            0 => None,
            1 => Some("1 duplicate image detected - reused existing URL".to_string()),
            n => Some(format!(
                "{} duplicate images detected - reused existing URLs",
                n
            )),
        }
    }
}

pub struct Uploader {
    service: Box<dyn ImageHostService>,
    cache: ImageCache,
}

impl Uploader {
    /// Load the cache from `store` and prune anything past the 30 day window.
    pub fn start(service: Box<dyn ImageHostService>, store: Box<dyn StateStore>) -> Self {
        let mut cache = ImageCache::load(store);
        let removed = cache.prune(Duration::days(CACHE_MAX_AGE_DAYS));
        if removed > 0 {
            info!(
                "Pruned {} cached upload(s) older than {} days",
                removed, CACHE_MAX_AGE_DAYS
            );
        }

        Self { service, cache }
    }

    /// Session against the real Images API, configured from the process
    /// environment.
    pub fn from_env(store: Box<dyn StateStore>) -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config, store))
    }

    /// Like [`Uploader::from_env`] but reading variables through `lookup`.
    /// Missing credentials fail here, before any client exists.
    pub fn from_lookup<F>(lookup: F, store: Box<dyn StateStore>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config::from_lookup(lookup)?;
        Ok(Self::from_config(&config, store))
    }

    fn from_config(config: &Config, store: Box<dyn StateStore>) -> Self {
        Self::start(Box::new(CloudflareImagesClient::new(config)), store)
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Return the cached URL for identical content, otherwise upload and
    /// remember the new URL.
    pub async fn upload_bytes(&mut self, data: &[u8], file_name: &str) -> Result<UploadOutcome> {
        let digest = content_digest(data);

        if let Some(entry) = self.cache.get(&digest) {
            info!(
                "Duplicate of {} detected, reusing {}",
                entry.original_file_name, entry.remote_url
            );
            return Ok(UploadOutcome {
                url: entry.remote_url.clone(),
                file_name: file_name.to_string(),
                duplicate: true,
            });
        }

        let url = self.service.upload_image(data, file_name).await?;
        info!("Uploaded {} to {}", file_name, url);
        self.cache.put(&digest, &url, file_name);

        Ok(UploadOutcome {
            url,
            file_name: file_name.to_string(),
            duplicate: false,
        })
    }

    /// Read `path` and upload it under its base name.
    pub async fn upload_file(&mut self, path: &Path) -> Result<UploadOutcome> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::Invariant(format!("Invalid image path: {}", path.display()))
            })?
            .to_string();

        self.upload_bytes(&data, &file_name).await
    }

    /// Upload a pasted `data:image/...;base64,...` payload.
    pub async fn upload_data_url(&mut self, data_url: &str) -> Result<UploadOutcome> {
        let (file_name, data) = decode_data_url(data_url)?;
        self.upload_bytes(&data, &file_name).await
    }

    /// Upload `paths` one at a time. A failing file is recorded and the rest
    /// of the batch carries on.
    pub async fn upload_batch(&mut self, paths: &[PathBuf], kind: DocumentKind) -> BatchReport {
        let mut report = BatchReport::default();

        for path in paths {
            match self.upload_file(path).await {
                Ok(outcome) => {
                    if outcome.duplicate {
                        report.duplicates += 1;
                    }
                    report
                        .links
                        .push(kind.format_link(&outcome.url, &outcome.file_name));
                }
                Err(e) => {
                    warn!("Failed to upload {}: {}", path.display(), e);
                    report.failures.push((path.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

/// Standard alphabet, padding optional on decode.
const PASTE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Split a pasted image data URL into a synthetic file name and its bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let trimmed = data_url.trim();
    let rest = trimmed
        .strip_prefix("data:image/")
        .ok_or_else(|| Error::InvalidDataUrl("expected a data:image/ URL".to_string()))?;
    let (media, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| Error::InvalidDataUrl("missing ;base64, marker".to_string()))?;

    let subtype = media.split_once(';').map_or(media, |(head, _)| head);

    let data = PASTE_ENGINE
        .decode(payload)
        .map_err(|e| Error::InvalidDataUrl(format!("bad base64 payload: {}", e)))?;

    let extension = match subtype {
        "svg+xml" => "svg",
        "jpeg" | "jpg" => "jpg",
        "" => "png",
        other => other,
    };
    Ok((format!("image.{}", extension), data))
}
