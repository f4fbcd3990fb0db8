// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authentication routes.

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::access_token;
use crate::middleware::RequestContext;
use crate::services::login::STATE_TTL;
use crate::services::OAuthError;
use crate::AppState;

/// Cookie correlating a login with its callback.
pub const STATE_COOKIE: &str = "oauthstate";
/// Cookie scope: covers both the initiation and callback routes.
const STATE_COOKIE_PATH: &str = "/api/v1/auth/google";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start).post(auth_start))
        .route("/auth/google/callback", get(auth_callback).post(auth_callback))
}

/// Routes that require an access token.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize, Validate)]
pub struct AuthStartParams {
    /// Where to send the user (with `access_token` appended) after login.
    #[serde(default)]
    #[validate(url)]
    redirect_url: Option<String>,
}

/// Start OAuth flow - set the state cookie and redirect to Google.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    params: std::result::Result<Query<AuthStartParams>, QueryRejection>,
) -> Result<(CookieJar, Redirect)> {
    let Query(params) = params.map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse OAuth start query");
        AppError::BadRequest("'redirect_url' is missing in the request".to_string())
    })?;

    let redirect_url = params
        .redirect_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("'redirect_url' is missing in the request".to_string())
        })?;

    params
        .validate()
        .map_err(|_| AppError::BadRequest("'redirect_url' must be an absolute URL".to_string()))?;

    let pending = state.login.begin(redirect_url)?;

    let cookie = Cookie::build((STATE_COOKIE, pending.state))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .secure(uses_https(&state.config.google.redirect_url))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(STATE_TTL.as_secs() as i64));

    tracing::info!(redirect_url = %redirect_url, "Starting OAuth flow, redirecting to Google");

    Ok((jar.add(cookie), Redirect::temporary(&pending.authorization_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, issue an access token.
///
/// For GET the parameters come from the query string, for POST from the
/// urlencoded body.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    jar: CookieJar,
    params: std::result::Result<Form<CallbackParams>, FormRejection>,
) -> Result<(CookieJar, Redirect)> {
    let Form(params) = params.map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse google auth callback");
        OAuthError::Provider(format!("malformed callback: {}", e))
    })?;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Err(OAuthError::Provider(error).into());
    }

    let cookie_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());

    let completed = state
        .login
        .complete(
            ctx.users.as_ref(),
            cookie_state.as_deref(),
            params.state.as_deref(),
            params.code.as_deref().unwrap_or_default(),
        )
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to process google auth callback"))?;

    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH));

    Ok((jar, Redirect::temporary(&completed.redirect_url)))
}

/// Logout - revoke the presented access token.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = access_token(&headers) {
        if state.login.logout(token) {
            tracing::info!("Access token revoked");
        }
    }
    StatusCode::NO_CONTENT
}

fn uses_https(url: &str) -> bool {
    url.starts_with("https://")
}
