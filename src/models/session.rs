// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cache entries.

use super::AccessLevel;

/// Session data bound to an issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: String,
    pub access_level: AccessLevel,
}

/// Value stored in the session cache.
///
/// Both kinds share one keyspace, so lookups always check the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEntry {
    /// Pending OAuth login: state token -> redirect URL.
    OAuthState { redirect_url: String },
    /// Issued access token -> session.
    Access(SessionData),
}

impl SessionEntry {
    pub fn into_redirect_url(self) -> Option<String> {
        match self {
            SessionEntry::OAuthState { redirect_url } => Some(redirect_url),
            SessionEntry::Access(_) => None,
        }
    }

    pub fn into_session(self) -> Option<SessionData> {
        match self {
            SessionEntry::Access(data) => Some(data),
            SessionEntry::OAuthState { .. } => None,
        }
    }
}
