//! Books repository for database operations

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, BookQuery, NewBook},
    repository::sort::{is_sort_unsupported, sort_and_page, SortOrder, SortValue},
};

/// API filter field -> column for bracket-suffixed numeric comparisons
const NUMERIC_FIELDS: &[(&str, &str)] = &[
    ("viewCount", "view_count"),
    ("borrowCount", "borrow_count"),
    ("year", "year"),
];

/// Comparison operator suffix -> SQL operator
const OPERATORS: &[(&str, &str)] = &[
    ("gt", ">"),
    ("gte", ">="),
    ("lt", "<"),
    ("lte", "<="),
    ("eq", "="),
    ("ne", "<>"),
];

fn escape(s: &str) -> String {
    s.replace('\'', "''")
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.parse::<i64>().ok()).filter(|v| *v > 0)
}

/// Resolve the sortBy parameter against the sortable columns; unknown values
/// fall back to creation time
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("title") => "title",
        Some("author") => "author",
        Some("isbn") => "isbn",
        Some("publisher") => "publisher",
        Some("year") => "year",
        Some("viewCount") => "view_count",
        Some("borrowCount") => "borrow_count",
        Some("lastBorrowedAt") => "last_borrowed_at",
        Some("updatedAt") => "updated_at",
        _ => "created_at",
    }
}

/// Translate bracket-suffixed filters (`viewCount[gt]=10`) into SQL
/// conditions. Unknown fields, unknown operators and non-numeric values are
/// silently dropped.
fn numeric_conditions(filters: &HashMap<String, String>) -> Vec<String> {
    let mut out = Vec::new();
    for (key, raw) in filters {
        let Some((field, rest)) = key.split_once('[') else {
            continue;
        };
        let Some(op) = rest.strip_suffix(']') else {
            continue;
        };
        let Some(column) = NUMERIC_FIELDS
            .iter()
            .find(|(api, _)| *api == field)
            .map(|(_, col)| *col)
        else {
            continue;
        };
        let Some(sql_op) = OPERATORS
            .iter()
            .find(|(name, _)| *name == op)
            .map(|(_, sql)| *sql)
        else {
            continue;
        };
        let Ok(value) = raw.parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        out.push(format!("{} {} {}", column, sql_op, value));
    }
    out.sort();
    out
}

/// Sort key of a book for the in-memory fallback path
fn sort_value(book: &Book, column: &str) -> Option<SortValue> {
    match column {
        "title" => Some(SortValue::Text(book.title.clone())),
        "author" => Some(SortValue::Text(book.author.clone())),
        "isbn" => Some(SortValue::Text(book.isbn.clone())),
        "publisher" => Some(SortValue::Text(book.publisher.clone())),
        "year" => Some(SortValue::Int(book.year as i64)),
        "view_count" => Some(SortValue::Int(book.view_count)),
        "borrow_count" => Some(SortValue::Int(book.borrow_count)),
        "last_borrowed_at" => book.last_borrowed_at.map(SortValue::Time),
        "updated_at" => Some(SortValue::Time(book.updated_at)),
        _ => Some(SortValue::Time(book.created_at)),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Get book by ID, bumping its view counter in the same statement
    pub async fn get_and_count_view(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Record a borrow on the book: counter plus last-borrowed timestamp
    pub async fn record_borrow(&self, id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET borrow_count = borrow_count + 1, last_borrowed_at = $2, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Check whether an ISBN is already taken, optionally excluding a book
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new book
    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, description, cover_image, author, isbn, publisher,
                year, category, location, is_highlighted,
                view_count, borrow_count, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, 0, $11, $11)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.cover_image)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.year)
        .bind(book.category)
        .bind(book.location)
        .bind(book.is_highlighted)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Partial update: only the provided fields change
    pub async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                cover_image = COALESCE($4, cover_image),
                author = COALESCE($5, author),
                isbn = COALESCE($6, isbn),
                publisher = COALESCE($7, publisher),
                year = COALESCE($8, year),
                category = COALESCE($9, category),
                location = COALESCE($10, location),
                is_highlighted = COALESCE($11, is_highlighted),
                updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.cover_image)
        .bind(&changes.author)
        .bind(&changes.isbn)
        .bind(&changes.publisher)
        .bind(changes.year)
        .bind(changes.category)
        .bind(changes.location)
        .bind(changes.is_highlighted)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Delete a book
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Search books with filters, sorting and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64, i64, i64)> {
        let page = parse_positive(query.page.as_deref()).unwrap_or(1);
        let limit = parse_positive(query.limit.as_deref()).unwrap_or(6);
        let offset = (page - 1) * limit;
        let order = SortOrder::from_param(query.sort_order.as_deref());
        let column = sort_column(query.sort_by.as_deref());

        let mut conditions = vec!["1=1".to_string()];

        if let Some(ref keyword) = query.keyword {
            if !keyword.is_empty() {
                let kw = escape(&keyword.to_lowercase());
                conditions.push(format!(
                    "(LOWER(title) LIKE '%{kw}%' OR LOWER(author) LIKE '%{kw}%' \
                     OR LOWER(isbn) LIKE '%{kw}%' OR LOWER(description) LIKE '%{kw}%')",
                    kw = kw
                ));
            }
        }

        if let Some(ref category) = query.category {
            if !category.is_empty() {
                conditions.push(format!("category = '{}'", escape(category)));
            }
        }

        if let Some(ref location) = query.location {
            if !location.is_empty() {
                conditions.push(format!("location = '{}'", escape(location)));
            }
        }

        if let Some(ref highlighted) = query.is_highlighted {
            if !highlighted.is_empty() {
                conditions.push(format!("is_highlighted = {}", highlighted == "true"));
            }
        }

        conditions.extend(numeric_conditions(&query.filters));

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM books WHERE {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_query)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "SELECT * FROM books WHERE {} ORDER BY {} {} LIMIT {} OFFSET {}",
            where_clause,
            column,
            order.as_sql(),
            limit,
            offset
        );

        let books = match sqlx::query_as::<_, Book>(&select_query)
            .fetch_all(&self.pool)
            .await
        {
            Ok(books) => books,
            Err(err) if is_sort_unsupported(&err) => {
                tracing::warn!(column, "sorted query rejected, using in-memory fallback");
                let unsorted_query = format!("SELECT * FROM books WHERE {}", where_clause);
                let unsorted = sqlx::query_as::<_, Book>(&unsorted_query)
                    .fetch_all(&self.pool)
                    .await?;
                sort_and_page(unsorted, order, offset as usize, limit as usize, |b| {
                    sort_value(b, column)
                })
            }
            Err(err) => return Err(err.into()),
        };

        Ok((books, total, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_filters_translate_known_fields() {
        let mut filters = HashMap::new();
        filters.insert("viewCount[gt]".to_string(), "10".to_string());
        filters.insert("year[lte]".to_string(), "2020".to_string());
        assert_eq!(
            numeric_conditions(&filters),
            vec!["view_count > 10".to_string(), "year <= 2020".to_string()]
        );
    }

    #[test]
    fn numeric_filters_drop_non_numeric_values() {
        let mut filters = HashMap::new();
        filters.insert("viewCount[gt]".to_string(), "lots".to_string());
        filters.insert("borrowCount[gte]".to_string(), "3".to_string());
        assert_eq!(
            numeric_conditions(&filters),
            vec!["borrow_count >= 3".to_string()]
        );
    }

    #[test]
    fn numeric_filters_drop_unknown_fields_and_operators() {
        let mut filters = HashMap::new();
        filters.insert("title[gt]".to_string(), "1".to_string());
        filters.insert("viewCount[regex]".to_string(), "1".to_string());
        filters.insert("viewCount".to_string(), "1".to_string());
        assert!(numeric_conditions(&filters).is_empty());
    }

    #[test]
    fn sort_column_falls_back_to_created_at() {
        assert_eq!(sort_column(Some("viewCount")), "view_count");
        assert_eq!(sort_column(Some("title")), "title");
        assert_eq!(sort_column(Some("password")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }

    #[test]
    fn escape_doubles_single_quotes() {
        assert_eq!(escape("O'Brien"), "O''Brien");
    }
}
