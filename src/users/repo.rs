use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, PublicUser, User};
use crate::auth::password;

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("username or email already exists")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence for user records.
///
/// Implementations must keep email and username unique and must hash the
/// password given in [`NewUser`] before storing it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user whose email equals `email` or whose username equals
    /// `username`. `None` arguments never match.
    async fn find_by_email_or_username(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Same lookup as [`UserStore::find_by_id`] but projected without
    /// password and refresh token.
    async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<PublicUser>>;

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError>;

    /// Overwrites the stored refresh token; `None` clears it.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str = "id, full_name, email, username, password_hash, avatar, cover_image, \
                            refresh_token, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email_or_username(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2 LIMIT 1"
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by email or username")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<PublicUser>> {
        let user = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, full_name, email, username, avatar, cover_image, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find public user by id")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        let hash = password::hash_password(&new.password)?;
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, email, username, password_hash, avatar, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.username)
        .bind(&hash)
        .bind(&new.avatar)
        .bind(&new.cover_image)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CreateUserError::Duplicate)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET refresh_token = $2, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await
        .context("update refresh token")?;
        Ok(())
    }
}
