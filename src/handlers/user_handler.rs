//! User Handler
//!
//! Credential store and verifier: registration, login and identity lookup.

use std::sync::Arc;

use crate::auth::{hash_password, verify_password};
use crate::domain::{DomainError, Identity, NewUser, User, DEFAULT_ROLE};
use crate::error::{AppError, AppResult};
use crate::repository::UserRepository;

use super::RegisterUserCommand;

pub const USER_NOT_FOUND_FOR_EMAIL: &str = "user not found for the given email";
pub const INVALID_PASSWORD: &str = "invalid password";
pub const EMAIL_ALREADY_REGISTERED: &str = "a user is already registered with this email";
pub const INVALID_NAME: &str = "invalid name";
pub const INVALID_EMAIL: &str = "invalid email";
pub const PASSWORD_REQUIRED: &str = "password required";

/// Emails are compared case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Handler for user registration and credential checks
#[derive(Clone)]
pub struct UserHandler {
    repository: Arc<dyn UserRepository>,
}

impl UserHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Register a new user with a hashed password
    pub async fn register_user(&self, command: RegisterUserCommand) -> AppResult<User> {
        let name = command.name.trim().to_string();
        let email = normalize_email(&command.email);

        if name.is_empty() {
            return Err(DomainError::validation(INVALID_NAME).into());
        }
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation(INVALID_EMAIL).into());
        }
        if command.password.is_empty() {
            return Err(DomainError::validation(PASSWORD_REQUIRED).into());
        }

        self.validate_email(&email).await?;

        let new_user = NewUser {
            name,
            email,
            password_hash: hash_password(&command.password),
            roles: vec![DEFAULT_ROLE.to_string()],
        };

        // A concurrent registration can still win the race to the unique index
        let user = self.repository.insert(&new_user).await.map_err(|e| {
            if e.is_conflict() {
                AppError::Domain(DomainError::validation(EMAIL_ALREADY_REGISTERED))
            } else {
                AppError::Repository(e)
            }
        })?;

        tracing::info!(user_id = user.id, "User registered");

        Ok(user)
    }

    /// Check an email/password pair and return the full user record
    pub async fn authenticate(&self, email: &str, raw_password: &str) -> AppResult<User> {
        let user = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| DomainError::authentication(USER_NOT_FOUND_FOR_EMAIL))?;

        if !verify_password(raw_password, &user.password_hash) {
            tracing::info!(user_id = user.id, "Rejected login with invalid password");
            return Err(DomainError::authentication(INVALID_PASSWORD).into());
        }

        Ok(user)
    }

    /// Check an email/password pair and return the identity it belongs to
    pub async fn verify_credentials(&self, email: &str, raw_password: &str) -> AppResult<Identity> {
        Ok(self.authenticate(email, raw_password).await?.identity())
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .repository
            .exists_by_email(&normalize_email(email))
            .await?)
    }

    /// Reject an email that is already registered
    pub async fn validate_email(&self, email: &str) -> AppResult<()> {
        if self.email_exists(email).await? {
            return Err(DomainError::validation(EMAIL_ALREADY_REGISTERED).into());
        }
        Ok(())
    }

    /// Identity lookup used by other services
    pub async fn find_by_email(&self, email: &str) -> AppResult<Identity> {
        self.repository
            .find_by_email(&normalize_email(email))
            .await?
            .map(|user| user.identity())
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND_FOR_EMAIL.to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.repository.find_by_id(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockUserRepository, RepositoryError};

    fn stored_user(password: &str) -> User {
        User {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: hash_password(password),
            roles: vec![DEFAULT_ROLE.to_string()],
        }
    }

    fn handler(repository: MockUserRepository) -> UserHandler {
        UserHandler::new(Arc::new(repository))
    }

    fn domain_message(result: AppError) -> String {
        match result {
            AppError::Domain(DomainError::Validation(msg))
            | AppError::Domain(DomainError::Authentication(msg)) => msg,
            other => panic!("expected domain error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_user_hashes_password() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_exists_by_email()
            .withf(|email: &str| email == "ana@example.com")
            .returning(|_| Ok(false));
        repository
            .expect_insert()
            .withf(|user: &NewUser| {
                user.email == "ana@example.com"
                    && user.password_hash != "s3cret"
                    && verify_password("s3cret", &user.password_hash)
                    && user.roles == vec![DEFAULT_ROLE.to_string()]
            })
            .times(1)
            .returning(|user| {
                Ok(User {
                    id: 1,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                    roles: user.roles.clone(),
                })
            });

        let command = RegisterUserCommand::new(
            "Ana".to_string(),
            " Ana@Example.com ".to_string(),
            "s3cret".to_string(),
        );
        let user = handler(repository).register_user(command).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_existing_email_without_insert() {
        let mut repository = MockUserRepository::new();
        repository.expect_exists_by_email().returning(|_| Ok(true));
        repository.expect_insert().never();

        let command = RegisterUserCommand::new(
            "Ana".to_string(),
            "ana@example.com".to_string(),
            "s3cret".to_string(),
        );
        let err = handler(repository).register_user(command).await.unwrap_err();

        assert_eq!(domain_message(err), EMAIL_ALREADY_REGISTERED);
    }

    #[tokio::test]
    async fn test_register_maps_unique_conflict_to_validation() {
        let mut repository = MockUserRepository::new();
        repository.expect_exists_by_email().returning(|_| Ok(false));
        repository
            .expect_insert()
            .returning(|_| Err(RepositoryError::Conflict("users_email_key".to_string())));

        let command = RegisterUserCommand::new(
            "Ana".to_string(),
            "ana@example.com".to_string(),
            "s3cret".to_string(),
        );
        let err = handler(repository).register_user(command).await.unwrap_err();

        assert_eq!(domain_message(err), EMAIL_ALREADY_REGISTERED);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let handler = handler(MockUserRepository::new());

        let err = handler
            .register_user(RegisterUserCommand::new(
                " ".to_string(),
                "ana@example.com".to_string(),
                "x".to_string(),
            ))
            .await
            .unwrap_err();
        assert_eq!(domain_message(err), INVALID_NAME);

        let err = handler
            .register_user(RegisterUserCommand::new(
                "Ana".to_string(),
                "not-an-email".to_string(),
                "x".to_string(),
            ))
            .await
            .unwrap_err();
        assert_eq!(domain_message(err), INVALID_EMAIL);

        let err = handler
            .register_user(RegisterUserCommand::new(
                "Ana".to_string(),
                "ana@example.com".to_string(),
                String::new(),
            ))
            .await
            .unwrap_err();
        assert_eq!(domain_message(err), PASSWORD_REQUIRED);
    }

    #[tokio::test]
    async fn test_verify_credentials_success() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_email()
            .returning(|_| Ok(Some(stored_user("s3cret"))));

        let identity = handler(repository)
            .verify_credentials("ana@example.com", "s3cret")
            .await
            .unwrap();

        assert_eq!(identity.id, 1);
        assert_eq!(identity.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_verify_credentials_unknown_email() {
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));

        let err = handler(repository)
            .verify_credentials("ana@example.com", "s3cret")
            .await
            .unwrap_err();

        assert_eq!(domain_message(err), USER_NOT_FOUND_FOR_EMAIL);
    }

    #[tokio::test]
    async fn test_verify_credentials_wrong_password() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_email()
            .returning(|_| Ok(Some(stored_user("s3cret"))));

        let err = handler(repository)
            .verify_credentials("ana@example.com", "123")
            .await
            .unwrap_err();

        assert_eq!(domain_message(err), INVALID_PASSWORD);
    }

    #[tokio::test]
    async fn test_find_by_email_miss_is_not_found() {
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));

        let err = handler(repository)
            .find_by_email("ghost@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
