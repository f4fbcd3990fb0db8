// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and photo routes (require authentication).

use crate::error::{AppError, Result};
use crate::middleware::RequestContext;
use crate::models::User;
use crate::storage::{content_type_for_key, ObjectStoreError};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Accepted photo extensions (compared lower-cased).
const PHOTO_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// User routes (require authentication via access token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me))
        .route(
            "/users/me/photo",
            get(get_photo).post(upload_photo).delete(delete_photo),
        )
        .route("/users/{user_id}", get(get_user))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn ok_message() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ok".to_string(),
    })
}

// ─── Profile ─────────────────────────────────────────────────

/// Get current user profile.
async fn get_me(ctx: RequestContext) -> Result<Json<User>> {
    let caller = ctx.principal()?;

    let user = ctx
        .users
        .get_user_by_id(&caller.user_id)
        .await
        .inspect_err(|e| {
            tracing::warn!(error = %e, user_id = %caller.user_id, "Failed to get user by ID")
        })?;

    Ok(Json(user))
}

/// Get any user; basic users may only fetch themselves.
async fn get_user(ctx: RequestContext, Path(user_id): Path<String>) -> Result<Json<User>> {
    let caller = ctx.principal()?;

    if !caller.can_view(&user_id) {
        tracing::warn!(
            caller = %caller.user_id,
            requested = %user_id,
            "Insufficient rights to view user"
        );
        return Err(AppError::Forbidden("insufficient rights".to_string()));
    }

    Ok(Json(ctx.users.get_user_by_id(&user_id).await?))
}

// ─── Photo ───────────────────────────────────────────────────

/// Lower-cased extension of `file_name` if it is an accepted image type.
fn photo_extension(file_name: &str) -> Option<String> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    PHOTO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn photo_key(user_id: &str, ext: &str) -> String {
    format!("{}-photo.{}", user_id, ext)
}

fn missing_form_file() -> AppError {
    AppError::BadRequest("failed to get the form file".to_string())
}

/// Upload profile photo from the multipart `file` field.
async fn upload_photo(
    ctx: RequestContext,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>> {
    let caller = ctx.principal()?.clone();

    let mut multipart = multipart.map_err(|e| {
        tracing::warn!(error = %e, "Photo upload is not a multipart form");
        missing_form_file()
    })?;

    let field = loop {
        let next = multipart.next_field().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read multipart body");
            missing_form_file()
        })?;
        match next {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => return Err(missing_form_file()),
        }
    };

    let ext = field
        .file_name()
        .and_then(photo_extension)
        .ok_or_else(|| {
            AppError::BadRequest(
                "invalid image format. Only JPEG and PNG are supported".to_string(),
            )
        })?;

    let data = field.bytes().await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read the form file");
        AppError::BadRequest("failed to read the form file".to_string())
    })?;

    let key = photo_key(&caller.user_id, &ext);
    let size = data.len();

    ctx.files
        .put_object(&key, data.to_vec())
        .await
        .inspect_err(|_| tracing::warn!(key = %key, "Failed to save the photo"))?;

    // The object is left in place if this fails.
    ctx.users
        .update_user_photo(&caller.user_id, &key)
        .await
        .inspect_err(|_| {
            tracing::warn!(user_id = %caller.user_id, key = %key, "Failed to set user photo URL")
        })?;

    tracing::info!(user_id = %caller.user_id, key = %key, size, "Photo uploaded");

    Ok(ok_message())
}

/// Download the current user's photo.
async fn get_photo(ctx: RequestContext) -> Result<impl IntoResponse> {
    let caller = ctx.principal()?;
    let user = ctx.users.get_user_by_id(&caller.user_id).await?;

    if !user.has_photo() {
        return Err(AppError::NotFound("no photo".to_string()));
    }

    let data = ctx.files.get_object(&user.photo_url).await?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for_key(&user.photo_url))],
        data,
    ))
}

/// Delete the current user's photo.
async fn delete_photo(ctx: RequestContext) -> Result<Json<MessageResponse>> {
    let caller = ctx.principal()?;

    let user = ctx
        .users
        .get_user_by_id(&caller.user_id)
        .await
        .inspect_err(|e| {
            tracing::warn!(error = %e, user_id = %caller.user_id, "Failed to get user by ID")
        })?;

    // No photo - nothing to delete.
    if !user.has_photo() {
        return Ok(ok_message());
    }

    match ctx.files.delete_object(&user.photo_url).await {
        Ok(()) => {}
        Err(ObjectStoreError::NotFound(key)) => {
            tracing::warn!(key = %key, "Photo already missing from the file store");
        }
        Err(e) => {
            tracing::warn!(key = %user.photo_url, "Failed to delete user photo");
            return Err(e.into());
        }
    }

    ctx.users
        .update_user_photo(&caller.user_id, "")
        .await
        .inspect_err(|_| {
            tracing::warn!(user_id = %caller.user_id, "Failed to clear user photo URL")
        })?;

    tracing::info!(user_id = %caller.user_id, "Photo deleted");

    Ok(ok_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_extension() {
        assert_eq!(photo_extension("me.png"), Some("png".to_string()));
        assert_eq!(photo_extension("me.JPG"), Some("jpg".to_string()));
        assert_eq!(
            photo_extension("holiday.photo.Jpeg"),
            Some("jpeg".to_string())
        );
        assert_eq!(photo_extension("anim.gif"), None);
        assert_eq!(photo_extension("png"), None);
        assert_eq!(photo_extension(""), None);
    }

    #[test]
    fn test_photo_key() {
        assert_eq!(photo_key("u1", "png"), "u1-photo.png");
    }
}
