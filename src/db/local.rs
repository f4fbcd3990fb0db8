// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON-file user store for local development and tests.
//!
//! All records live in memory behind one lock and the whole array is
//! rewritten on every mutation, so requests against this store are fully
//! serialized.

use super::{StoreError, UserStore};
use crate::models::User;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct LocalUserStore {
    path: PathBuf,
    users: Mutex<Vec<User>>,
}

impl LocalUserStore {
    /// Open the store at `path`, creating an empty file if none exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let users = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice::<Vec<User>>(&data).map_err(|e| {
                StoreError::Backend(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                save(&path, &[]).await?;
                Vec::new()
            }
            Err(e) => {
                return Err(StoreError::Backend(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(path = %path.display(), users = users.len(), "Opened local user store");

        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }
}

/// Write the user array next to `path`, then move it into place.
async fn save(path: &Path, users: &[User]) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(users)
        .map_err(|e| StoreError::Backend(format!("Failed to encode users: {}", e)))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to replace {}: {}", path.display(), e)))
}

#[async_trait]
impl UserStore for LocalUserStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        if user.id.is_empty() {
            return Err(StoreError::InvalidArgument("missing id"));
        }

        let mut users = self.users.lock().await;

        if users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::Conflict(format!("user {}", user.id)));
        }
        if !user.email.is_empty() && users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }

        users.push(user.clone());
        if let Err(e) = save(&self.path, &users).await {
            users.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        if id.is_empty() {
            return Err(StoreError::InvalidArgument("missing id"));
        }

        let users = self.users.lock().await;
        users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        if email.is_empty() {
            return Err(StoreError::InvalidArgument("missing email"));
        }

        let users = self.users.lock().await;
        users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_user_photo(&self, id: &str, photo_url: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        let previous = std::mem::replace(&mut user.photo_url, photo_url.to_string());

        if let Err(e) = save(&self.path, &users).await {
            if let Some(user) = users.iter_mut().find(|u| u.id == id) {
                user.photo_url = previous;
            }
            return Err(e);
        }
        Ok(())
    }
}
