//! Borrow records repository for database operations

use chrono::{DateTime, Duration, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::borrow::{
        BookSummary, BorrowDetails, BorrowRecord, BorrowStatus, UserSummary,
    },
    repository::sort::{is_sort_unsupported, sort_and_page, SortOrder, SortValue},
};

/// Default loan duration in days
const DEFAULT_LOAN_DAYS: i64 = 14;

/// Extract the borrow record columns from a (possibly joined) row
fn record_from_row(row: &PgRow) -> BorrowRecord {
    BorrowRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        book_id: row.get("book_id"),
        borrow_date: row.get("borrow_date"),
        due_date: row.get("due_date"),
        return_date: row.get("return_date"),
        comments: row.get("comments"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find the active record for a (user, book) pair, if any
    pub async fn active_record(
        &self,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE user_id = $1 AND book_id = $2 AND status = 'active' LIMIT 1",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Most recent record for a (user, book) pair, active or not
    pub async fn most_recent_record(
        &self,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<BorrowRecord>> {
        let result = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE user_id = $1 AND book_id = $2 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(err) if is_sort_unsupported(&err) => {
                let all = sqlx::query_as::<_, BorrowRecord>(
                    "SELECT * FROM borrow_records WHERE user_id = $1 AND book_id = $2",
                )
                .bind(user_id)
                .bind(book_id)
                .fetch_all(&self.pool)
                .await?;
                let sorted = sort_and_page(all, SortOrder::Desc, 0, 1, |r| {
                    Some(SortValue::Time(r.created_at))
                });
                Ok(sorted.into_iter().next())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create a new active borrow record.
    ///
    /// The existence check and this insert are separate statements; two
    /// concurrent borrows of the same pair can both pass the check.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        due_date: Option<DateTime<Utc>>,
    ) -> AppResult<BorrowRecord> {
        let now = Utc::now();
        let due = due_date.unwrap_or(now + Duration::days(DEFAULT_LOAN_DAYS));

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (user_id, book_id, borrow_date, due_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'active', $3, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Mark a record as returned, stamping the return date
    pub async fn mark_returned(
        &self,
        record_id: i32,
        comments: Option<&str>,
    ) -> AppResult<BorrowRecord> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE borrow_records
            SET status = 'returned', return_date = $2,
                comments = COALESCE($3, comments), updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(now)
        .bind(comments)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Borrow records of a user, most recent first, with book summaries
    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<BorrowStatus>,
        page: i64,
        limit: i64,
    ) -> AppResult<(Vec<BorrowDetails>, i64)> {
        let offset = (page - 1) * limit;

        let mut conditions = vec![format!("r.user_id = {}", user_id)];
        if let Some(status) = status {
            conditions.push(format!("r.status = '{}'", status.as_str()));
        }
        let where_clause = conditions.join(" AND ");

        let count_query = format!(
            "SELECT COUNT(*) FROM borrow_records r WHERE {}",
            where_clause
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .fetch_one(&self.pool)
            .await?;

        let base_query = format!(
            r#"
            SELECT r.id, r.user_id, r.book_id, r.borrow_date, r.due_date,
                   r.return_date, r.comments, r.status, r.created_at, r.updated_at,
                   b.title, b.author, b.cover_image, b.location
            FROM borrow_records r
            JOIN books b ON b.id = r.book_id
            WHERE {}
            "#,
            where_clause
        );

        let sorted_query = format!(
            "{} ORDER BY r.created_at DESC LIMIT {} OFFSET {}",
            base_query, limit, offset
        );

        let to_details = |row: &PgRow| BorrowDetails {
            record: record_from_row(row),
            user: None,
            book: Some(BookSummary {
                id: row.get("book_id"),
                title: row.get("title"),
                author: row.get("author"),
                cover_image: row.get("cover_image"),
                location: row.get("location"),
            }),
        };

        let records = match sqlx::query(&sorted_query).fetch_all(&self.pool).await {
            Ok(rows) => rows.iter().map(to_details).collect(),
            Err(err) if is_sort_unsupported(&err) => {
                let rows = sqlx::query(&base_query).fetch_all(&self.pool).await?;
                let all: Vec<BorrowDetails> = rows.iter().map(to_details).collect();
                sort_and_page(all, SortOrder::Desc, offset as usize, limit as usize, |d| {
                    Some(SortValue::Time(d.record.created_at))
                })
            }
            Err(err) => return Err(err.into()),
        };

        Ok((records, total))
    }

    /// Borrow records of a book, most recent first, with borrower summaries
    pub async fn list_for_book(
        &self,
        book_id: i32,
        page: i64,
        limit: i64,
    ) -> AppResult<(Vec<BorrowDetails>, i64)> {
        let offset = (page - 1) * limit;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrow_records WHERE book_id = $1")
                .bind(book_id)
                .fetch_one(&self.pool)
                .await?;

        let base_query = r#"
            SELECT r.id, r.user_id, r.book_id, r.borrow_date, r.due_date,
                   r.return_date, r.comments, r.status, r.created_at, r.updated_at,
                   u.email, u.first_name, u.last_name
            FROM borrow_records r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = $1
            "#;

        let sorted_query = format!(
            "{} ORDER BY r.created_at DESC LIMIT {} OFFSET {}",
            base_query, limit, offset
        );

        let to_details = |row: &PgRow| BorrowDetails {
            record: record_from_row(row),
            user: Some(UserSummary {
                id: row.get("user_id"),
                email: row.get("email"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
            }),
            book: None,
        };

        let records = match sqlx::query(&sorted_query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows.iter().map(to_details).collect(),
            Err(err) if is_sort_unsupported(&err) => {
                let rows = sqlx::query(base_query)
                    .bind(book_id)
                    .fetch_all(&self.pool)
                    .await?;
                let all: Vec<BorrowDetails> = rows.iter().map(to_details).collect();
                sort_and_page(all, SortOrder::Desc, offset as usize, limit as usize, |d| {
                    Some(SortValue::Time(d.record.created_at))
                })
            }
            Err(err) => return Err(err.into()),
        };

        Ok((records, total))
    }

    /// Attach a borrower summary to a single record (for borrow/return responses)
    pub async fn with_user_summary(&self, record: BorrowRecord) -> AppResult<BorrowDetails> {
        let user = sqlx::query(
            "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(record.user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| UserSummary {
            id: row.get("id"),
            email: row.get("email"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
        });

        Ok(BorrowDetails {
            record,
            user,
            book: None,
        })
    }
}
