use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{cookies, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState};

/// Authenticated caller, taken from the `accessToken` cookie or a bearer token.
/// The first of the two that verifies wins.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let candidates: Vec<String> = cookies::get_cookie(&parts.headers, cookies::ACCESS_COOKIE)
            .into_iter()
            .chain(bearer_token(parts))
            .collect();
        if candidates.is_empty() {
            return Err(ApiError::unauthorized("Unauthorized request"));
        }

        // A stale cookie must not shadow a valid Authorization header.
        let keys = JwtKeys::from_ref(state);
        let claims = candidates
            .iter()
            .find_map(|token| match keys.verify_access(token) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    warn!(error = %e, "invalid or expired access token");
                    None
                }
            })
            .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

        // Tokens outlive deleted accounts.
        if state.users.find_by_id(claims.sub).await?.is_none() {
            warn!(user_id = %claims.sub, "access token for unknown user");
            return Err(ApiError::unauthorized("Invalid access token"));
        }

        Ok(AuthUser(claims.sub))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
