//! Borrow ledger service

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowDetails, BorrowQuery, BorrowStatus, BorrowStatusResponse},
    repository::Repository,
};

/// Parse a due date given as RFC 3339 or as a plain YYYY-MM-DD day (taken at
/// midnight UTC)
fn parse_due_date(raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(AppError::BadRequest("Invalid dueDate format".to_string()))
}

fn parse_status(raw: Option<&str>) -> AppResult<Option<BorrowStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid status filter".to_string())),
    }
}

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for the current user.
    ///
    /// At most one active record may exist per (user, book) pair; a second
    /// borrow is rejected until the first is returned.
    pub async fn borrow(
        &self,
        user_id: i32,
        book_id: i32,
        due_date: Option<&str>,
    ) -> AppResult<BorrowDetails> {
        self.repository.books.get_by_id(book_id).await?;

        let due = match due_date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_due_date(raw)?),
            None => None,
        };

        if self
            .repository
            .borrows
            .active_record(user_id, book_id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "You have already borrowed this book and not returned it yet.".to_string(),
            ));
        }

        let record = self.repository.borrows.create(user_id, book_id, due).await?;
        self.repository.books.record_borrow(book_id).await?;

        self.repository.borrows.with_user_summary(record).await
    }

    /// Return the current user's active borrow of a book
    pub async fn return_book(
        &self,
        user_id: i32,
        book_id: i32,
        comments: Option<&str>,
    ) -> AppResult<BorrowDetails> {
        self.repository.books.get_by_id(book_id).await?;

        let active = self
            .repository
            .borrows
            .active_record(user_id, book_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(
                    "You do not have an active borrow for this book.".to_string(),
                )
            })?;

        let record = self
            .repository
            .borrows
            .mark_returned(active.id, comments)
            .await?;

        self.repository.borrows.with_user_summary(record).await
    }

    /// Borrow status of a book for the current user
    pub async fn status(&self, user_id: i32, book_id: i32) -> AppResult<BorrowStatusResponse> {
        self.repository.books.get_by_id(book_id).await?;

        let active = self
            .repository
            .borrows
            .active_record(user_id, book_id)
            .await?;
        let last = self
            .repository
            .borrows
            .most_recent_record(user_id, book_id)
            .await?;

        Ok(BorrowStatusResponse {
            is_borrowed: active.is_some(),
            active_borrow: active,
            last_record: last,
        })
    }

    /// Borrow records of the current user, with book summaries.
    /// Returns (records, total, page, limit).
    pub async fn list_for_user(
        &self,
        user_id: i32,
        query: &BorrowQuery,
    ) -> AppResult<(Vec<BorrowDetails>, i64, i64, i64)> {
        let status = parse_status(query.status.as_deref())?;
        let page = query.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = query.limit.filter(|l| *l > 0).unwrap_or(10);

        let (records, total) = self
            .repository
            .borrows
            .list_for_user(user_id, status, page, limit)
            .await?;

        Ok((records, total, page, limit))
    }

    /// Borrow history of another user, for admin views. Smaller default page
    /// than the self listing.
    pub async fn history_for_user(
        &self,
        user_id: i32,
        query: &BorrowQuery,
    ) -> AppResult<(Vec<BorrowDetails>, i64, i64, i64)> {
        self.repository.users.get_by_id(user_id).await?;

        let status = parse_status(query.status.as_deref())?;
        let page = query.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = query.limit.filter(|l| *l > 0).unwrap_or(5);

        let (records, total) = self
            .repository
            .borrows
            .list_for_user(user_id, status, page, limit)
            .await?;

        Ok((records, total, page, limit))
    }

    /// Borrow records of a book, with borrower summaries, for admin views.
    /// Returns (records, total, page, limit).
    pub async fn history_for_book(
        &self,
        book_id: i32,
        query: &BorrowQuery,
    ) -> AppResult<(Vec<BorrowDetails>, i64, i64, i64)> {
        self.repository.books.get_by_id(book_id).await?;

        let page = query.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = query.limit.filter(|l| *l > 0).unwrap_or(10);

        let (records, total) = self
            .repository
            .borrows
            .list_for_book(book_id, page, limit)
            .await?;

        Ok((records, total, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn due_date_parses_rfc3339_and_plain_dates() {
        let rfc = parse_due_date("2026-09-06T12:30:00Z").unwrap();
        assert_eq!(rfc.year(), 2026);

        let plain = parse_due_date("2026-09-06").unwrap();
        assert_eq!(plain.month(), 9);
        assert_eq!(plain.day(), 6);
    }

    #[test]
    fn due_date_rejects_garbage() {
        assert!(parse_due_date("next tuesday").is_err());
        assert!(parse_due_date("06/09/2026").is_err());
    }

    #[test]
    fn status_filter_accepts_known_values_only() {
        assert_eq!(parse_status(Some("active")).unwrap(), Some(BorrowStatus::Active));
        assert_eq!(parse_status(Some("returned")).unwrap(), Some(BorrowStatus::Returned));
        assert_eq!(parse_status(Some("")).unwrap(), None);
        assert_eq!(parse_status(None).unwrap(), None);
        assert!(parse_status(Some("overdue")).is_err());
    }
}
