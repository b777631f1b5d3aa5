use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{CreateUserError, UserStore},
    repo_types::{NewUser, PublicUser, User},
};
use crate::auth::password;

/// `UserStore` kept in a vector, for handler tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    /// `create` returns an error without storing anything.
    pub fail_create: AtomicBool,
    /// `find_public_by_id` never finds a record.
    pub hide_public: AtomicBool,
}

impl InMemoryUserStore {
    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn find_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email_or_username(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| email == Some(u.email.as_str()) || username == Some(u.username.as_str()))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<PublicUser>> {
        if self.hide_public.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.get(id).map(PublicUser::from))
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("connection reset").into());
        }
        let password_hash = password::hash_password(&new.password)?;
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email == new.email || u.username == new.username)
        {
            return Err(CreateUserError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            full_name: new.full_name,
            email: new.email,
            username: new.username,
            password_hash,
            avatar: new.avatar,
            cover_image: new.cover_image,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> anyhow::Result<()> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.refresh_token = token.map(str::to_string);
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }
}
