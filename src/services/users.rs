//! User management service (admin operations)

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserQuery},
    repository::Repository,
    services::auth,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List users with filters, sorting and pagination.
    /// Returns (users, total, page, limit).
    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64, i64, i64)> {
        self.repository.users.search(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user. Email and password are mandatory; the email must be
    /// unique, reported as a conflict.
    pub async fn create(&self, request: &CreateUser) -> AppResult<User> {
        let email = request
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let password = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty());

        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::BadRequest(
                "Email and password are required.".to_string(),
            ));
        };

        request.validate()?;

        if self.repository.users.email_exists(&email, None).await? {
            return Err(AppError::Conflict(
                "Email is already registered.".to_string(),
            ));
        }

        let hash = auth::hash_password(password)?;

        self.repository
            .users
            .create(
                &email,
                &hash,
                request.first_name.as_deref(),
                request.last_name.as_deref(),
                request.role.unwrap_or(Role::User),
                request.is_active.unwrap_or(true),
            )
            .await
    }

    /// Partial update. A changed email must stay unique; unlike creation this
    /// is reported as a plain bad request.
    pub async fn update(&self, id: i32, request: &UpdateUser) -> AppResult<User> {
        self.repository.users.get_by_id(id).await?;

        request.validate()?;

        if let Some(ref email) = request.email {
            let email = email.trim().to_lowercase();
            if self.repository.users.email_exists(&email, Some(id)).await? {
                return Err(AppError::BadRequest("Email must be unique.".to_string()));
            }
        }

        let password_hash = match request.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(auth::hash_password(password)?),
            None => None,
        };

        self.repository.users.update(id, request, password_hash).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.repository.users.delete(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
