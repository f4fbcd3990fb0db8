// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google_oauth;
pub mod login;

pub use google_oauth::{GoogleOAuthClient, GoogleUserInfo, OAuthError};
pub use login::{CompletedLogin, LoginService, PendingLogin};
