// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (request context, authentication).

pub mod auth;
pub mod context;

pub use auth::require_access_token;
pub use context::{attach_context, RequestContext};
