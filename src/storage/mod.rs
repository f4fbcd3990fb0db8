// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object store for user photos: interface and backends (Cloud Storage, local disk).

pub mod gcs;
pub mod local;

pub use gcs::GcsObjectStore;
pub use local::LocalObjectStore;

use async_trait::async_trait;

/// Object store errors.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0:?}")]
    InvalidKey(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Blob storage keyed by flat string keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite the object at `key`.
    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError>;

    /// Read the whole object at `key`.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Delete the object at `key`.
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;
}

/// MIME type for an object, from its key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = std::path::Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
