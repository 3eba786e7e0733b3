use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{AuthRequest, User};
use crate::infrastructure::security::{generate_token, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register_user(&self, req: AuthRequest) -> Result<User> {
        trace!("Starting user registration");
        validate_credentials(&req)?;

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = User {
            email: req.email,
            password_hash,
        };

        debug!("Saving user to repository");
        if !self.user_repository.insert_user(user.clone()).await? {
            warn!(email = %user.email, "User already exists");
            return Err(DomainError::Validation("Email already registered".to_string()).into());
        }

        info!(email = %user.email, "User registered successfully");
        Ok(user)
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: AuthRequest) -> Result<String> {
        trace!("Starting login");
        validate_credentials(&req)?;

        let user = self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| {
                warn!(email = %req.email, "User not found during login");
                DomainError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        // A record that is not a password hash can never match.
        let is_valid = verify_password(&req.password, &user.password_hash).unwrap_or_else(|e| {
            warn!(email = %user.email, error = %e, "Stored credential is not a password hash");
            false
        });

        if !is_valid {
            warn!(email = %user.email, "Invalid password during login");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }

        let token = generate_token(&user.email, &self.jwt_secret).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e))
        })?;

        info!(email = %user.email, "Login successful");
        Ok(token)
    }
}

fn validate_credentials(req: &AuthRequest) -> Result<(), DomainError> {
    if req.email.trim().is_empty() {
        return Err(DomainError::Validation("Email must not be empty".to_string()));
    }
    if req.password.is_empty() {
        return Err(DomainError::Validation("Password must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::InMemoryUserRepository;
    use crate::infrastructure::security::validate_token;

    const SECRET: &str = "unit-test-secret";

    fn service() -> (AuthService, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        (AuthService::new(repo.clone(), SECRET.to_string()), repo)
    }

    fn creds(email: &str, password: &str) -> AuthRequest {
        AuthRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (service, repo) = service();

        service
            .register_user(creds("a@example.com", "secret-pass"))
            .await
            .unwrap();

        let stored = repo
            .find_user_by_email("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "secret-pass");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_is_validation_error() {
        let (service, _) = service();
        service
            .register_user(creds("dup@example.com", "one"))
            .await
            .unwrap();

        let err = service
            .register_user(creds("dup@example.com", "two"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_issues_token_for_email() {
        let (service, _) = service();
        service
            .register_user(creds("token@example.com", "pw"))
            .await
            .unwrap();

        let token = service.login(creds("token@example.com", "pw")).await.unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap(), "token@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let (service, _) = service();
        service
            .register_user(creds("wrong@example.com", "right"))
            .await
            .unwrap();

        let err = service
            .login(creds("wrong@example.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_login_against_plaintext_record_is_unauthorized() {
        let (service, repo) = service();
        repo.insert_user(User {
            email: "legacy@example.com".to_string(),
            password_hash: "hunter2".to_string(),
        })
        .await
        .unwrap();

        let err = service
            .login(creds("legacy@example.com", "hunter2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_credentials_are_rejected() {
        let (service, _) = service();

        let err = service.register_user(creds("  ", "pw")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));

        let err = service.login(creds("a@example.com", "")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }
}
