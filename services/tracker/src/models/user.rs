//! User model and related functionality

use serde::Deserialize;

/// Stored user record
///
/// Holds the argon2 PHC string only; the plaintext never reaches the store.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

/// Username/password pair submitted to register or login
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Hand-written so the password never ends up in a log line.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a credential check that reached the password comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    WrongPassword,
}
