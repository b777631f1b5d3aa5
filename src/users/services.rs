use anyhow::Context;
use axum::extract::FromRef;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{TokenPair, ValidRegistration},
    repo::CreateUserError,
    repo_types::{NewUser, PublicUser},
};
use crate::{
    auth::jwt::JwtKeys,
    error::ApiError,
    media::services as media,
    state::AppState,
};

/// Signs a fresh access/refresh pair for `user_id` and stores the refresh
/// token on the record, replacing any previous one.
pub async fn generate_access_and_refresh_tokens(
    st: &AppState,
    user_id: Uuid,
) -> Result<TokenPair, ApiError> {
    issue(st, user_id).await.map_err(ApiError::TokenGeneration)
}

async fn issue(st: &AppState, user_id: Uuid) -> anyhow::Result<TokenPair> {
    let user = st
        .users
        .find_by_id(user_id)
        .await?
        .with_context(|| format!("user {} not found", user_id))?;

    let keys = JwtKeys::from_ref(st);
    let access_token = keys.sign_access(user.id, user.identity())?;
    let refresh_token = keys.sign_refresh(user.id)?;

    st.users
        .set_refresh_token(user.id, Some(&refresh_token))
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

pub async fn register_user(st: &AppState, reg: ValidRegistration) -> Result<PublicUser, ApiError> {
    let existing = st
        .users
        .find_by_email_or_username(Some(&reg.email), Some(&reg.username))
        .await?;
    if existing.is_some() {
        warn!(username = %reg.username, "username or email already exists");
        return Err(ApiError::Conflict("Username or email already exists".into()));
    }

    let storage = st.storage.as_ref();
    let avatar = media::upload(storage, "avatar", Some(reg.avatar)).await;
    let cover = media::upload(storage, "cover", reg.cover_image).await;

    let Some(avatar) = avatar else {
        if let Some(c) = &cover {
            media::discard(storage, &[c]).await;
        }
        return Err(ApiError::UploadFailed("Avatar upload failed".into()));
    };

    let created = st
        .users
        .create(NewUser {
            full_name: reg.full_name,
            email: reg.email,
            username: reg.username,
            password: reg.password,
            avatar: avatar.url.clone(),
            cover_image: cover.as_ref().map(|c| c.url.clone()).unwrap_or_default(),
        })
        .await;

    let user = match created {
        Ok(u) => u,
        Err(e) => {
            let uploaded: Vec<_> = std::iter::once(&avatar).chain(cover.as_ref()).collect();
            media::discard(storage, &uploaded).await;
            return Err(match e {
                // Lost a race with a concurrent registration.
                CreateUserError::Duplicate => {
                    ApiError::Conflict("Username or email already exists".into())
                }
                CreateUserError::Other(e) => ApiError::Internal(e),
            });
        }
    };

    // From here on the row references the uploaded media; keep it.
    let public = st
        .users
        .find_public_by_id(user.id)
        .await?
        .ok_or_else(|| {
            error!(user_id = %user.id, "created user not readable");
            ApiError::CreationFailed("User creation failed".into())
        })?;

    info!(user_id = %public.id, username = %public.username, "user registered");
    Ok(public)
}
