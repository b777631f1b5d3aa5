use axum::{
    extract::{
        multipart::{Field, MultipartRejection}, DefaultBodyLimit, FromRef, Multipart,
        State,
    },
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, LoginResponse, RefreshRequest, RegisterForm, TokenPair},
    repo_types::PublicUser,
    services::{generate_access_and_refresh_tokens, register_user},
};
use crate::{
    auth::{cookies, extractors::AuthUser, jwt::JwtKeys},
    error::ApiError,
    media::services::UploadItem,
    response::ApiResponse,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/register",
            post(register).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/refresh-token", post(refresh_access_token))
        .route("/users/current-user", get(current_user))
}

/// POST /users/register (multipart)
/// Fields: fullName, email, username, password; files: avatar, coverImage?
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let mp = mp.map_err(|e| {
        warn!(error = %e, "register without multipart body");
        ApiError::validation("Request body is missing")
    })?;
    let form = read_register_form(mp).await?;
    let reg = form.validate()?;
    let user = register_user(&state, reg).await?;
    Ok(ApiResponse::created(user, "User created successfully"))
}

async fn read_register_form(mut mp: Multipart) -> Result<RegisterForm, ApiError> {
    let mut form = RegisterForm::default();
    let mut seen_any = false;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed request body: {}", e.body_text())))?
    {
        seen_any = true;
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "fullName" => form.full_name = Some(text(field).await?),
            "email" => form.email = Some(text(field).await?),
            "username" => form.username = Some(text(field).await?),
            "password" => form.password = Some(text(field).await?),
            // Only the first part of each file field counts.
            "avatar" if form.avatar.is_none() => form.avatar = file(field).await?,
            "coverImage" if form.cover_image.is_none() => form.cover_image = file(field).await?,
            _ => {}
        }
    }
    if !seen_any {
        return Err(ApiError::validation("Request body is missing"));
    }
    Ok(form)
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed request body: {}", e.body_text())))
}

async fn file(field: Field<'_>) -> Result<Option<UploadItem>, ApiError> {
    if field.file_name().map_or(true, str::is_empty) {
        return Ok(None);
    }
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".into());
    let body = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed request body: {}", e.body_text())))?;
    // A zero-byte part is treated as no file at all.
    if body.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadItem { body, content_type }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let username = payload
        .username
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty());

    if email.is_none() && username.is_none() {
        return Err(ApiError::validation("Email or username is required"));
    }
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    let user = state
        .users
        .find_by_email_or_username(email.as_deref(), username.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User does not exist".into()))?;

    if !user.is_password_correct(&password)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid user credentials"));
    }

    let TokenPair {
        access_token,
        refresh_token,
    } = generate_access_and_refresh_tokens(&state, user.id).await?;

    let logged_in = state
        .users
        .find_public_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User does not exist".into()))?;

    let cookies = cookies::token_cookies(&access_token, &refresh_token)?;
    info!(user_id = %user.id, "user logged in");
    Ok((
        AppendHeaders(cookies),
        ApiResponse::ok(
            LoginResponse {
                user: logged_in,
                access_token,
                refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.users.set_refresh_token(user_id, None).await?;
    info!(%user_id, "user logged out");
    Ok((
        AppendHeaders(cookies::cleared_cookies()),
        ApiResponse::ok(json!({}), "User logged out successfully"),
    ))
}

/// Exchanges the stored refresh token for a new pair.
#[instrument(skip(state, headers, payload))]
pub async fn refresh_access_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let incoming = cookies::get_cookie(&headers, cookies::REFRESH_COOKIE)
        .or_else(|| payload.and_then(|Json(p)| p.refresh_token))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&incoming)
        .map_err(|e| {
            warn!(error = %e, "invalid refresh token");
            ApiError::unauthorized("Invalid refresh token")
        })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        warn!(user_id = %user.id, "stale refresh token presented");
        return Err(ApiError::unauthorized("Refresh token is expired or used"));
    }

    let pair = generate_access_and_refresh_tokens(&state, user.id).await?;
    let cookies = cookies::token_cookies(&pair.access_token, &pair.refresh_token)?;
    info!(user_id = %user.id, "access token refreshed");
    Ok((
        AppendHeaders(cookies),
        ApiResponse::ok(pair, "Access token refreshed"),
    ))
}

#[instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let user = state
        .users
        .find_public_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;
    Ok(ApiResponse::ok(user, "Current user fetched successfully"))
}
