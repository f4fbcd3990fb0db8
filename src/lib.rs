// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend bootstrap: Google sign-in, sessions and user profiles.
//!
//! This crate provides an HTTP API that authenticates users through Google
//! OAuth2, issues short-lived access tokens kept in an in-memory session
//! cache, and serves user profiles and profile photos from pluggable
//! storage backends.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;

use cache::SessionCache;
use config::Config;
use db::UserStore;
use services::{GoogleOAuthClient, LoginService, OAuthError};
use std::sync::Arc;
use storage::ObjectStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub files: Arc<dyn ObjectStore>,
    pub sessions: SessionCache,
    pub login: LoginService,
}

impl AppState {
    /// Wire up shared state around the chosen storage backends.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        files: Arc<dyn ObjectStore>,
    ) -> Result<Self, OAuthError> {
        let sessions = SessionCache::new();
        let google = GoogleOAuthClient::new(config.google.clone())?;
        let login = LoginService::new(google, sessions.clone());

        Ok(Self {
            config,
            users,
            files,
            sessions,
            login,
        })
    }
}
