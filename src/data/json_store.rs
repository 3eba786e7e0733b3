//! User store persisted as one flat JSON object mapping email to password
//! hash.
//!
//! The whole table is read and rewritten on every registration. Writers are
//! serialized by an in-process lock and the file is replaced through a
//! rename, so readers never see a half-written table.

use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, trace};

type UserTable = BTreeMap<String, String>;

pub struct JsonFileUserRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileUserRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<UserTable> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "User store file absent, starting empty");
                return Ok(UserTable::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read user store {}", self.path.display())
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(UserTable::new());
        }

        serde_json::from_slice(&bytes)
            .with_context(|| format!("User store {} is not a JSON object", self.path.display()))
    }

    async fn persist(&self, table: &UserTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(table).context("Failed to encode user store")?;
        fs::write(&tmp_path, body)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for JsonFileUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email, path = %self.path.display()))]
    async fn insert_user(&self, user: User) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut table = self.load().await?;
        if table.contains_key(&user.email) {
            debug!("Email already present in user store");
            return Ok(false);
        }

        table.insert(user.email, user.password_hash);
        self.persist(&table).await?;
        info!(users = table.len(), "User store rewritten");
        Ok(true)
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let table = self.load().await?;
        Ok(table.get(email).map(|hash| User {
            email: email.to_string(),
            password_hash: hash.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn user(email: &str, hash: &str) -> User {
        User {
            email: email.to_string(),
            password_hash: hash.to_string(),
        }
    }

    fn store_in(dir: &TempDir) -> JsonFileUserRepository {
        JsonFileUserRepository::new(dir.path().join("users.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let repo = store_in(&dir);

        let found = repo.find_user_by_email("nobody@example.com").await.unwrap();
        assert!(found.is_none());
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn test_insert_writes_flat_object() {
        let dir = TempDir::new().unwrap();
        let repo = store_in(&dir);

        assert!(repo.insert_user(user("a@example.com", "hash-a")).await.unwrap());

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "a@example.com": "hash-a" }));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        store_in(&dir)
            .insert_user(user("keep@example.com", "hash"))
            .await
            .unwrap();

        let reopened = store_in(&dir);
        let found = reopened
            .find_user_by_email("keep@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_first_record() {
        let dir = TempDir::new().unwrap();
        let repo = store_in(&dir);

        assert!(repo.insert_user(user("dup@example.com", "first")).await.unwrap());
        assert!(!repo.insert_user(user("dup@example.com", "second")).await.unwrap());

        let found = repo
            .find_user_by_email("dup@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.password_hash, "first");
    }

    #[tokio::test]
    async fn test_empty_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let repo = store_in(&dir);
        std::fs::write(repo.path(), "  \n").unwrap();

        assert!(repo.insert_user(user("first@example.com", "h")).await.unwrap());
        assert!(
            repo.find_user_by_email("first@example.com")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let repo = store_in(&dir);
        std::fs::write(repo.path(), "[1, 2, 3]").unwrap();

        assert!(repo.find_user_by_email("a@example.com").await.is_err());
        assert!(repo.insert_user(user("a@example.com", "h")).await.is_err());
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileUserRepository::new(dir.path().join("state").join("users.json"));

        assert!(repo.insert_user(user("nested@example.com", "h")).await.unwrap());
        assert!(repo.path().exists());
    }

    #[tokio::test]
    async fn test_concurrent_registrations_lose_no_updates() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(store_in(&dir));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.insert_user(user(&format!("user{}@example.com", i), "h"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        let table: UserTable = serde_json::from_str(&raw).unwrap();
        assert_eq!(table.len(), 20);
    }
}
