//! Borrow and return endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::borrow::{
        BorrowDetails, BorrowQuery, BorrowRequest, BorrowStatusResponse, ReturnRequest,
    },
    AppState,
};

use super::{parse_book_id, parse_user_id, AuthenticatedUser, PaginatedResponse};

/// Borrow a book
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Borrow recorded", body = BorrowDetails),
        (status = 400, description = "Already borrowed or invalid due date"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    body: Option<Json<BorrowRequest>>,
) -> AppResult<(axum::http::StatusCode, Json<BorrowDetails>)> {
    let id = parse_book_id(&id)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let record = state
        .services
        .borrows
        .borrow(user.id, id, request.due_date.as_deref())
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Return recorded", body = BorrowDetails),
        (status = 400, description = "No active borrow"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    body: Option<Json<ReturnRequest>>,
) -> AppResult<Json<BorrowDetails>> {
    let id = parse_book_id(&id)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let record = state
        .services
        .borrows
        .return_book(user.id, id, request.comments.as_deref())
        .await?;

    Ok(Json(record))
}

/// Borrow status of a book for the current user
#[utoipa::path(
    get,
    path = "/books/{id}/borrow-status",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrow status", body = BorrowStatusResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn borrow_status(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BorrowStatusResponse>> {
    let id = parse_book_id(&id)?;
    let status = state.services.borrows.status(user.id, id).await?;
    Ok(Json(status))
}

/// Borrow history of a book, with borrower summaries
#[utoipa::path(
    get,
    path = "/books/{id}/borrow-history",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<i64>, Query, description = "Records per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Paginated borrow history", body = PaginatedResponse<BorrowDetails>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_borrow_history(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowDetails>>> {
    user.require_admin()?;

    let id = parse_book_id(&id)?;
    let (records, total, page, limit) =
        state.services.borrows.history_for_book(id, &query).await?;
    Ok(Json(PaginatedResponse::new(records, total, page, limit)))
}

/// Current user's borrow records, with book summaries
#[utoipa::path(
    get,
    path = "/borrow/my",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status: \"active\" or \"returned\""),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<i64>, Query, description = "Records per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Paginated borrow records", body = PaginatedResponse<BorrowDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowDetails>>> {
    let (records, total, page, limit) =
        state.services.borrows.list_for_user(user.id, &query).await?;
    Ok(Json(PaginatedResponse::new(records, total, page, limit)))
}

/// Borrow history of a user, with book summaries
#[utoipa::path(
    get,
    path = "/users/{id}/borrow-history",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<i64>, Query, description = "Records per page (default: 5)")
    ),
    responses(
        (status = 200, description = "Paginated borrow history", body = PaginatedResponse<BorrowDetails>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_borrow_history(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowDetails>>> {
    user.require_admin()?;

    let id = parse_user_id(&id)?;
    let (records, total, page, limit) =
        state.services.borrows.history_for_user(id, &query).await?;
    Ok(Json(PaginatedResponse::new(records, total, page, limit)))
}
