use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::PublicUser;
use crate::{error::ApiError, media::services::UploadItem};

/// Raw registration form as read from the multipart body.
#[derive(Default)]
pub struct RegisterForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<UploadItem>,
    pub cover_image: Option<UploadItem>,
}

/// Registration input that passed shape validation.
pub struct ValidRegistration {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: UploadItem,
    pub cover_image: Option<UploadItem>,
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl RegisterForm {
    pub fn validate(self) -> Result<ValidRegistration, ApiError> {
        let (Some(full_name), Some(email), Some(username), Some(password)) = (
            present(self.full_name),
            present(self.email),
            present(self.username),
            // Surrounding whitespace is part of a password.
            self.password.filter(|p| !p.trim().is_empty()),
        ) else {
            return Err(ApiError::validation("All fields are required"));
        };

        let email = email.to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::validation("Invalid email"));
        }

        let avatar = self
            .avatar
            .ok_or_else(|| ApiError::validation("Avatar file is required"))?;

        Ok(ValidRegistration {
            full_name,
            email,
            username: username.to_lowercase(),
            password,
            avatar,
            cover_image: self.cover_image,
        })
    }
}

/// Request body for login. Either identifier may be given.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request body for token refresh, used when no cookie is sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}
