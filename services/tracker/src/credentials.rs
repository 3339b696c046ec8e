//! Credential store: registration and password checks
//!
//! Passwords are hashed with argon2 and a fresh random salt per user. Each
//! login is a stateless check; no session or token is issued.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{TrackerError, TrackerResult},
    models::{Credentials, LoginOutcome},
    repositories::UserRepository,
    validation::{validate_password, validate_username},
};

/// Credential store
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new user
    ///
    /// Fails with `DuplicateUser` when the username is taken, including when
    /// a concurrent registration wins the insert.
    pub async fn register(&self, credentials: &Credentials) -> TrackerResult<()> {
        validate_username(&credentials.username)?;
        validate_password(&credentials.password)?;

        if self.users.find_user(&credentials.username).await?.is_some() {
            warn!("Registration rejected, user exists: {}", credentials.username);
            return Err(TrackerError::DuplicateUser);
        }

        let password_hash = hash_password(&credentials.password).await?;
        self.users
            .insert_user(&credentials.username, &password_hash)
            .await?;

        info!("Registered user: {}", credentials.username);
        Ok(())
    }

    /// Check a username/password pair
    ///
    /// `UserNotFound` is an error; a mismatch is reported as
    /// [`LoginOutcome::WrongPassword`].
    pub async fn login(&self, credentials: &Credentials) -> TrackerResult<LoginOutcome> {
        info!("Login attempt for user: {}", credentials.username);

        let user = self
            .users
            .find_user(&credentials.username)
            .await?
            .ok_or(TrackerError::UserNotFound)?;

        if verify_password(&credentials.password, &user.password_hash).await? {
            Ok(LoginOutcome::Authenticated)
        } else {
            Ok(LoginOutcome::WrongPassword)
        }
    }
}

/// Hash off the async workers; argon2 is deliberately slow.
async fn hash_password(password: &str) -> TrackerResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || -> TrackerResult<_> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| TrackerError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| TrackerError::Hashing(e.to_string()))?
}

async fn verify_password(password: &str, password_hash: &str) -> TrackerResult<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || -> TrackerResult<_> {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| TrackerError::Hashing(format!("Failed to parse password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| TrackerError::Hashing(e.to_string()))?
}
