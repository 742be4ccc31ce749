//! Uploader for Cloudflare Images with a content-addressed dedup cache
//!
//! Uploads local images to the Images API and hands back delivery URLs,
//! reusing the URL of any content uploaded in the last 30 days instead of
//! uploading it again. Also ships a batch tool that removes recent uploads.

pub mod cache;
pub mod error;
pub mod format;
pub mod hash;
pub mod images;
pub mod models;
pub mod purge;
pub mod uploader;

pub use error::{Error, Result};
