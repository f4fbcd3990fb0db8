// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token authentication middleware.

use crate::error::AppError;
use crate::middleware::context::RequestContext;
use crate::models::AccessLevel;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header carrying the access token issued at login.
pub const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Authenticated user resolved from the session cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub access_level: AccessLevel,
}

impl AuthUser {
    /// Whether this caller may read `user_id`'s record.
    pub fn can_view(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.access_level.is_admin()
    }
}

/// Read the access token header, if present and non-empty.
pub fn access_token(request_headers: &axum::http::HeaderMap) -> Option<&str> {
    request_headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a live access token.
///
/// Missing header is 401; a token the session cache doesn't know is 403.
pub async fn require_access_token(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("'Access-Token' header is missing".to_string()))?;

    let session = state
        .login
        .authenticate(token)
        .ok_or_else(|| AppError::Forbidden("no access".to_string()))?;

    let ctx = request
        .extensions_mut()
        .get_mut::<RequestContext>()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("request context not attached")))?;

    ctx.principal = Some(AuthUser {
        user_id: session.user_id,
        access_level: session.access_level,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_view() {
        let basic = AuthUser {
            user_id: "u1".to_string(),
            access_level: AccessLevel::Basic,
        };
        let admin = AuthUser {
            user_id: "u2".to_string(),
            access_level: AccessLevel::Admin,
        };

        assert!(basic.can_view("u1"));
        assert!(!basic.can_view("u2"));
        assert!(admin.can_view("u1"));
        assert!(admin.can_view("u2"));
    }

    #[test]
    fn test_access_token_header() {
        let mut headers = axum::http::HeaderMap::new();
        assert_eq!(access_token(&headers), None);

        headers.insert(ACCESS_TOKEN_HEADER, "".parse().unwrap());
        assert_eq!(access_token(&headers), None);

        headers.insert(ACCESS_TOKEN_HEADER, "abc".parse().unwrap());
        assert_eq!(access_token(&headers), Some("abc"));
    }
}
