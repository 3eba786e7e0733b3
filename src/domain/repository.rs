use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores `user` unless its email is already taken. Returns `false` on
    /// conflict, leaving the existing record untouched.
    async fn insert_user(&self, user: User) -> Result<bool>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}
