//! API handlers for the Libris REST endpoints

pub mod auth;
pub mod books;
pub mod borrows;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::CurrentUser,
    repository::sort::total_pages,
    AppState,
};

/// Extractor for the authenticated user. The token is verified against the
/// secret and the account itself is re-checked on every request, so a token
/// of a deleted or deactivated account stops working immediately.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Authentication("Missing authentication token".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Authentication("Missing authentication token".to_string())
        })?;

        let claims = state.services.auth.verify_token(token)?;
        let user = state.services.auth.current_user(&claims).await?;

        Ok(AuthenticatedUser(user))
    }
}

/// Parse a path segment as a book ID
pub fn parse_book_id(raw: &str) -> AppResult<i32> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid book ID format".to_string()))
}

/// Parse a path segment as a user ID
pub fn parse_user_id(raw: &str) -> AppResult<i32> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID format".to_string()))
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Page of results
    pub data: Vec<T>,
    /// Total number of matching records
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Records per page
    pub limit: i64,
    /// Total number of pages
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            data,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

/// Response body for delete operations
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_parsing_rejects_non_numeric_segments() {
        assert!(parse_book_id("42").is_ok());
        assert!(parse_book_id("abc").is_err());
        assert!(parse_user_id("12x").is_err());
        assert!(parse_user_id("-3").is_ok());
    }

    #[test]
    fn paginated_response_computes_total_pages() {
        let response = PaginatedResponse::<crate::models::book::Book>::new(vec![], 13, 1, 6);
        assert_eq!(response.total_pages, 3);

        let response = PaginatedResponse::<crate::models::book::Book>::new(vec![], 0, 1, 6);
        assert_eq!(response.total_pages, 0);
    }
}
