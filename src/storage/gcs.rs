// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Cloud Storage object store.
//!
//! Objects are stored privately in a single bucket with their content type
//! derived from the key extension.

use super::{content_type_for_key, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use std::sync::Arc;

/// Cloud Storage client bound to one bucket.
#[derive(Clone)]
pub struct GcsObjectStore {
    bucket: String,
    client: Option<Arc<Client>>,
}

impl GcsObjectStore {
    /// Connect to Cloud Storage.
    ///
    /// For local development with an emulator, set STORAGE_EMULATOR_HOST.
    pub async fn new(bucket: &str) -> Result<Self, ObjectStoreError> {
        let config = match std::env::var("STORAGE_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(
                    host = %host,
                    "Using unauthenticated connection for Storage Emulator"
                );
                ClientConfig {
                    storage_endpoint: host,
                    ..ClientConfig::default().anonymous()
                }
            }
            Err(_) => ClientConfig::default().with_auth().await.map_err(|e| {
                ObjectStoreError::Backend(format!("Failed to create Storage auth config: {}", e))
            })?,
        };

        tracing::info!(bucket, "Connected to Cloud Storage");

        Ok(Self {
            bucket: bucket.to_string(),
            client: Some(Arc::new(Client::new(config))),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All operations return a backend error.
    pub fn new_mock(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            client: None,
        }
    }

    fn get_client(&self) -> Result<&Client, ObjectStoreError> {
        self.client.as_deref().ok_or_else(|| {
            ObjectStoreError::Backend("Cloud Storage not connected (offline mode)".to_string())
        })
    }
}

fn map_error(key: &str, err: google_cloud_storage::http::Error) -> ObjectStoreError {
    match err {
        google_cloud_storage::http::Error::Response(resp) if resp.code == 404 => {
            ObjectStoreError::NotFound(key.to_string())
        }
        other => ObjectStoreError::Backend(format!("{}: {}", key, other)),
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        let mut media = Media::new(key.to_string());
        media.content_type = content_type_for_key(key).into();

        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        self.get_client()?
            .upload_object(&request, data, &UploadType::Simple(media))
            .await
            .map_err(|e| map_error(key, e))?;

        tracing::debug!(bucket = %self.bucket, key, "Uploaded object");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: key.to_string(),
            ..Default::default()
        };

        self.get_client()?
            .download_object(&request, &Range::default())
            .await
            .map_err(|e| map_error(key, e))
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        let request = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            object: key.to_string(),
            ..Default::default()
        };

        self.get_client()?
            .delete_object(&request)
            .await
            .map_err(|e| map_error(key, e))
    }
}
