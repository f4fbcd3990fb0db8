// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User record store: interface and backends (Firestore, local JSON file).

pub mod firestore;
pub mod local;

pub use firestore::FirestoreUserStore;
pub use local::LocalUserStore;

use crate::models::User;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// User store errors.
///
/// `NotFound` is an expected outcome (first login, missing photo) and must be
/// kept distinct from backend failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `Conflict` if the ID is taken.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Find a user by ID.
    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError>;

    /// Find a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Set (or clear, with an empty key) the user's photo reference.
    async fn update_user_photo(&self, id: &str, photo_url: &str) -> Result<(), StoreError>;
}
