// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google login flow and session tokens.
//!
//! A login moves through three steps:
//! 1. `begin`: a random state token is cached with the caller's redirect URL
//! 2. `complete`: the callback's state is checked against the cookie, the
//!    cached entry is consumed, the code is exchanged and the user is found
//!    or created
//! 3. an access token is minted and cached with the user's session data
//!
//! Access tokens are then resolved on every protected request via
//! `authenticate`.

use crate::cache::SessionCache;
use crate::db::{StoreError, UserStore};
use crate::error::AppError;
use crate::models::{SessionData, SessionEntry, User};
use crate::services::google_oauth::{GoogleOAuthClient, OAuthError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::Url;
use ring::rand::{SecureRandom, SystemRandom};
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Lifetime of a pending login.
pub const STATE_TTL: Duration = Duration::from_secs(60 * 60);
/// Lifetime of an issued access token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const STATE_BYTES: usize = 16;
const ACCESS_TOKEN_BYTES: usize = 32;

/// A login waiting for the provider callback.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub state: String,
    pub authorization_url: String,
}

/// A successfully completed login.
#[derive(Debug, Clone)]
pub struct CompletedLogin {
    pub user: User,
    pub access_token: String,
    /// Caller's redirect URL with `access_token` appended.
    pub redirect_url: String,
}

/// Drives the Google login flow against the session cache.
#[derive(Clone)]
pub struct LoginService {
    google: GoogleOAuthClient,
    sessions: SessionCache,
    rng: SystemRandom,
}

impl LoginService {
    pub fn new(google: GoogleOAuthClient, sessions: SessionCache) -> Self {
        Self {
            google,
            sessions,
            rng: SystemRandom::new(),
        }
    }

    /// Start a login that will return to `redirect_url`.
    pub fn begin(&self, redirect_url: &str) -> Result<PendingLogin, AppError> {
        let state = random_token(&self.rng, STATE_BYTES)?;

        self.sessions.set(
            state.clone(),
            SessionEntry::OAuthState {
                redirect_url: redirect_url.to_string(),
            },
            STATE_TTL,
        );

        Ok(PendingLogin {
            authorization_url: self.google.authorization_url(&state),
            state,
        })
    }

    /// Finish a login from the provider callback.
    ///
    /// `cookie_state` is the value of the state cookie set by `begin` and
    /// `form_state` is the `state` parameter Google sent back. They must match
    /// before anything else happens.
    pub async fn complete(
        &self,
        users: &dyn UserStore,
        cookie_state: Option<&str>,
        form_state: Option<&str>,
        code: &str,
    ) -> Result<CompletedLogin, AppError> {
        let cookie_state = cookie_state.ok_or(OAuthError::MissingStateCookie)?;
        let form_state = form_state.unwrap_or_default();
        if !bool::from(cookie_state.as_bytes().ct_eq(form_state.as_bytes())) {
            return Err(OAuthError::StateMismatch.into());
        }

        // Consumed up front: a replayed or concurrent callback for the same
        // state fails here without reaching Google.
        let redirect_url = self
            .sessions
            .take(cookie_state)
            .and_then(SessionEntry::into_redirect_url)
            .ok_or_else(|| OAuthError::UnknownState(cookie_state.to_string()))?;

        let google_user = self.google.user_info_for_code(code).await?;

        let user = match users.get_user_by_email(&google_user.email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                let user = User::from_google_login(
                    &google_user.given_name,
                    &google_user.family_name,
                    &google_user.email,
                );
                users.create_user(&user).await.map_err(|e| {
                    tracing::warn!(email = %user.email, "Failed to create user");
                    AppError::from(e)
                })?;
                tracing::info!(user_id = %user.id, "Created a new user");
                user
            }
            Err(e) => {
                tracing::warn!(email = %google_user.email, "Failed to get user by email");
                return Err(e.into());
            }
        };

        let access_token = random_token(&self.rng, ACCESS_TOKEN_BYTES)?;
        let redirect_url = with_access_token(&redirect_url, &access_token)?;

        self.sessions.set(
            access_token.clone(),
            SessionEntry::Access(SessionData {
                user_id: user.id.clone(),
                access_level: user.access_level,
            }),
            ACCESS_TOKEN_TTL,
        );

        tracing::info!(user_id = %user.id, "Google login completed, session issued");

        Ok(CompletedLogin {
            user,
            access_token,
            redirect_url,
        })
    }

    /// Resolve an access token to its session.
    pub fn authenticate(&self, access_token: &str) -> Option<SessionData> {
        self.sessions
            .get(access_token)
            .and_then(SessionEntry::into_session)
    }

    /// Revoke an access token. Returns whether it was live.
    pub fn logout(&self, access_token: &str) -> bool {
        if self.authenticate(access_token).is_none() {
            return false;
        }
        self.sessions.delete(access_token);
        true
    }
}

/// URL-safe random token of `len` bytes of entropy.
fn random_token(rng: &SystemRandom, len: usize) -> Result<String, AppError> {
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Set `access_token` on `redirect_url`, replacing any existing value.
fn with_access_token(redirect_url: &str, access_token: &str) -> Result<String, OAuthError> {
    let mut url =
        Url::parse(redirect_url).map_err(|e| OAuthError::InvalidRedirect(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("access_token", access_token);

    Ok(url.to_string())
}
