// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 client.
//!
//! Handles:
//! - Building the consent URL for a state token
//! - Exchanging an authorization code for a provider access token
//! - Fetching the signed-in user's profile

use crate::config::GoogleOAuthConfig;
use serde::Deserialize;
use std::time::Duration;

/// Bound on every outbound call to Google.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("missing oauthstate cookie")]
    MissingStateCookie,

    #[error("invalid oauth google state")]
    StateMismatch,

    #[error("state {0} is missing from the session cache")]
    UnknownState(String),

    #[error("provider returned error: {0}")]
    Provider(String),

    #[error("code exchange failed: {0}")]
    Exchange(String),

    #[error("failed getting user info: {0}")]
    UserInfo(String),

    #[error("invalid redirect url: {0}")]
    InvalidRedirect(String),
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

/// Google OAuth client. Cheap to clone.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| OAuthError::Exchange(format!("failed building HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Consent page URL carrying `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&self.config.scopes.join(" ")),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for a provider access token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(OAuthError::Exchange(format!("status {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(format!("failed to parse token response: {}", e)))
    }

    /// Fetch the profile for a provider access token.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::UserInfo(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::UserInfo(format!("status {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::UserInfo(format!("failed to parse user info: {}", e)))
    }

    /// Code exchange followed by the profile fetch.
    pub async fn user_info_for_code(&self, code: &str) -> Result<GoogleUserInfo, OAuthError> {
        let token = self.exchange_code(code).await?;
        self.fetch_user_info(&token.access_token).await
    }
}
