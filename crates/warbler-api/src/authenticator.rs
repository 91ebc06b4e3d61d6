use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{info, warn};

use warbler_db::Database;
use warbler_types::api::SignupRequest;
use warbler_types::error::{Result, WarblerError};
use warbler_types::models::{User, UserId};

/// Hash password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WarblerError::Internal(format!("password hashing failed: {e}")))
}

/// Checks `password` against a stored PHC hash string. A malformed stored
/// hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Unparseable password hash in store: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub struct Authenticator<'a> {
    db: &'a Database,
}

impl<'a> Authenticator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Validates, hashes and stores a new account. Username or email
    /// collisions come back from the store as value errors.
    pub fn signup(&self, req: &SignupRequest) -> Result<User> {
        req.validate()?;

        let password_hash = hash_password(&req.password)?;
        let user_id = self.db.create_user(
            &req.username,
            &req.email,
            &password_hash,
            req.image_url.as_deref(),
        )?;

        info!("Created user {} (#{})", req.username, user_id);
        self.db
            .get_user(user_id)?
            .map(|row| row.into_user())
            .ok_or(WarblerError::NotFound("user"))
    }

    /// Returns the user when the credentials match, `None` otherwise.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(row) = self.db.get_user_by_username(username)? else {
            return Ok(None);
        };
        if !verify_password(password, &row.password) {
            return Ok(None);
        }
        Ok(Some(row.into_user()))
    }

    /// Re-checks the current password of an existing account.
    pub fn verify_user_password(&self, user_id: UserId, password: &str) -> Result<()> {
        let row = self
            .db
            .get_user(user_id)?
            .ok_or(WarblerError::NotFound("user"))?;
        if verify_password(password, &row.password) {
            Ok(())
        } else {
            Err(WarblerError::BadCredentials)
        }
    }
}
