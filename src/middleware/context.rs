// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request context.
//!
//! `attach_context` puts a [`RequestContext`] into every API request's
//! extensions. The access-token middleware later fills in the principal.

use crate::cache::SessionCache;
use crate::db::UserStore;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::storage::ObjectStore;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Collaborators and identity available to handlers.
#[derive(Clone)]
pub struct RequestContext {
    pub users: Arc<dyn UserStore>,
    pub files: Arc<dyn ObjectStore>,
    pub sessions: SessionCache,
    /// Set once the access token has been checked.
    pub principal: Option<AuthUser>,
}

impl RequestContext {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            files: Arc::clone(&state.files),
            sessions: state.sessions.clone(),
            principal: None,
        }
    }

    /// The authenticated caller.
    pub fn principal(&self) -> Result<&AuthUser, AppError> {
        self.principal
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

/// Middleware attaching a fresh [`RequestContext`] to the request.
pub async fn attach_context(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(RequestContext::from_state(&state));
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("request context not attached")))
    }
}
