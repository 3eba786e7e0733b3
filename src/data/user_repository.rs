use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

/// Volatile store keyed by email, used by tests and ephemeral deployments.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: User) -> Result<bool> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        match storage.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                debug!(email = %user.email, "Email already present in memory storage");
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(user);
                debug!("User saved to memory storage");
                Ok(true)
            }
        }
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        trace!("Acquiring read lock for user storage");
        let storage = self.storage.read().await;
        let user = storage.get(email).cloned();
        match &user {
            Some(_) => debug!("User found in storage"),
            None => trace!("User not found in storage"),
        }
        Ok(user)
    }
}
