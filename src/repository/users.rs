//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, UpdateUser, User, UserQuery},
    repository::sort::{is_sort_unsupported, sort_and_page, SortOrder, SortValue},
};

fn escape(s: &str) -> String {
    s.replace('\'', "''")
}

/// Sortable user columns; unknown values fall back to creation time
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("email") => "email",
        Some("firstName") => "first_name",
        Some("lastName") => "last_name",
        Some("role") => "role",
        _ => "created_at",
    }
}

/// Sort key of a user for the in-memory fallback path
fn sort_value(user: &User, column: &str) -> Option<SortValue> {
    match column {
        "email" => Some(SortValue::Text(user.email.clone())),
        "first_name" => user.first_name.clone().map(SortValue::Text),
        "last_name" => user.last_name.clone().map(SortValue::Text),
        "role" => Some(SortValue::Text(user.role.as_str().to_string())),
        _ => Some(SortValue::Time(user.created_at)),
    }
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Find user by ID, None when absent
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Find user by email (caller lowercases)
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether an email is already registered, optionally excluding a user
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new user with an already-hashed password
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        role: Role,
        is_active: bool,
    ) -> AppResult<User> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, first_name, last_name, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(role)
        .bind(is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Partial update: only the provided fields change. The password, when
    /// present, must already be hashed.
    pub async fn update(
        &self,
        id: i32,
        changes: &UpdateUser,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let email = changes.email.as_ref().map(|e| e.trim().to_lowercase());

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password = COALESCE($3, password),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                role = COALESCE($6, role),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Delete a user
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Search users with filters, sorting and pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64, i64, i64)> {
        let page = query.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = query.limit.filter(|l| *l > 0).unwrap_or(10);
        let offset = (page - 1) * limit;
        let order = SortOrder::from_param(query.sort_order.as_deref());
        let column = sort_column(query.sort_by.as_deref());

        let mut conditions = vec!["1=1".to_string()];

        if let Some(ref role) = query.role {
            if !role.is_empty() {
                conditions.push(format!("role = '{}'", escape(role)));
            }
        }

        if let Some(ref keyword) = query.keyword {
            if !keyword.is_empty() {
                let kw = escape(&keyword.to_lowercase());
                conditions.push(format!(
                    "(LOWER(email) LIKE '%{kw}%' OR LOWER(first_name) LIKE '%{kw}%' \
                     OR LOWER(last_name) LIKE '%{kw}%')",
                    kw = kw
                ));
            }
        }

        // Only the literal strings apply the filter; other values are ignored
        match query.is_active.as_deref() {
            Some("true") => conditions.push("is_active = true".to_string()),
            Some("false") => conditions.push("is_active = false".to_string()),
            _ => {}
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM users WHERE {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_query)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "SELECT * FROM users WHERE {} ORDER BY {} {} LIMIT {} OFFSET {}",
            where_clause,
            column,
            order.as_sql(),
            limit,
            offset
        );

        let users = match sqlx::query_as::<_, User>(&select_query)
            .fetch_all(&self.pool)
            .await
        {
            Ok(users) => users,
            Err(err) if is_sort_unsupported(&err) => {
                tracing::warn!(column, "sorted query rejected, using in-memory fallback");
                let unsorted_query = format!("SELECT * FROM users WHERE {}", where_clause);
                let unsorted = sqlx::query_as::<_, User>(&unsorted_query)
                    .fetch_all(&self.pool)
                    .await?;
                sort_and_page(unsorted, order, offset as usize, limit as usize, |u| {
                    sort_value(u, column)
                })
            }
            Err(err) => return Err(err.into()),
        };

        Ok((users, total, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_column_only_accepts_whitelisted_fields() {
        assert_eq!(sort_column(Some("email")), "email");
        assert_eq!(sort_column(Some("firstName")), "first_name");
        assert_eq!(sort_column(Some("password")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }
}
