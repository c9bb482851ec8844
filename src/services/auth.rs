//! Authentication service: login, token issuing and password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CurrentUser, Role, User, UserClaims},
    repository::Repository,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Verify credentials and issue a token.
    ///
    /// A wrong email and a wrong password produce the same message, so the
    /// response does not reveal which accounts exist. A disabled account with
    /// correct credentials is reported as such.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let email = email.trim().to_lowercase();

        let user = self
            .repository
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials.".to_string()))?;

        if !self.verify_password(password, &user.password)? {
            return Err(AppError::Authentication("Invalid credentials.".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Authorization("Account is disabled.".to_string()));
        }

        let claims = UserClaims::for_user(&user, self.config.jwt_expiration_hours);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((user, token))
    }

    /// Resolve a verified token to the current account state. Deleted and
    /// deactivated accounts are rejected with 401 even when the token is
    /// still valid; only login distinguishes a disabled account with 403.
    pub async fn current_user(&self, claims: &UserClaims) -> AppResult<CurrentUser> {
        let user = self
            .repository
            .users
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid or expired token".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled.".to_string()));
        }

        Ok(user.into())
    }

    /// Verify a token string against the configured secret
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))
    }

    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        hash_password(password)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        verify_password(password, hash)
    }

    /// Create the default admin and user accounts when they are missing.
    /// Existing accounts are never touched.
    pub async fn seed_default_accounts(&self) -> AppResult<()> {
        let defaults = [
            ("admin@library.com", "Admin123!", "Admin", Role::Admin),
            ("user@library.com", "User123!", "Normal", Role::User),
        ];

        for (email, password, first_name, role) in defaults {
            if self.repository.users.find_by_email(email).await?.is_some() {
                continue;
            }
            let hash = self.hash_password(password)?;
            self.repository
                .users
                .create(email, &hash, Some(first_name), Some("User"), role, true)
                .await?;
            tracing::info!(email, "seeded default account");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("Admin123!").unwrap();
        assert!(verify_password("Admin123!", &hash).unwrap());
        assert!(!verify_password("Admin123", &hash).unwrap());
    }

    #[test]
    fn two_hashes_of_same_password_differ() {
        let a = hash_password("User123!").unwrap();
        let b = hash_password("User123!").unwrap();
        assert_ne!(a, b);
    }
}
