//! User profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use jobboard_models::{NewUserProfile, UserProfile};

use crate::auth::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::security::validate_document_url;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserProfile>,
    pub count: usize,
}

/// Create or replace the caller's profile. Email defaults to the token's.
pub async fn create_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut profile): Json<NewUserProfile>,
) -> ApiResult<(StatusCode, Json<CreateUserResponse>)> {
    if profile.email.trim().is_empty() {
        profile.email = user.email.clone().unwrap_or_default();
    }
    for url in [&profile.resume_url, &profile.cover_letter_url]
        .into_iter()
        .flatten()
    {
        validate_document_url(url).map_err(ApiError::Validation)?;
    }

    let uid = state.users.create_user_document(&user.uid, profile).await?;
    info!(uid = %uid, "Profile created via sign-up");

    Ok((StatusCode::CREATED, Json(CreateUserResponse { uid })))
}

pub async fn get_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.users.get_user_profile(&user.uid).await?;
    Ok(Json(profile))
}

/// All profiles, newest first (admin only).
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Json<UsersResponse>> {
    let users = state.users.get_all_users().await?;
    info!(admin = %admin.uid, count = users.len(), "Listed users");
    Ok(Json(UsersResponse {
        count: users.len(),
        users,
    }))
}
