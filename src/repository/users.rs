//! Staff user domain methods on Repository

use super::{is_foreign_key_violation, is_unique_violation, Repository};
use crate::{
    error::{AppError, AppResult},
    models::user::{Librarian, Role, UpdateLibrarian, User},
};

const LIBRARIAN_COLUMNS: &str = "user_id, username, email, phone, role, created_at";

fn user_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Username or email already in use".to_string())
    } else {
        AppError::Database(err)
    }
}

impl Repository {
    /// Get user by username
    pub async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, email, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn users_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create a staff user from an already hashed password
    pub async fn users_create(
        &self,
        username: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
        role: Role,
    ) -> AppResult<Librarian> {
        sqlx::query_as::<_, Librarian>(&format!(
            r#"
            INSERT INTO users (username, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            LIBRARIAN_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(user_conflict)
    }

    /// Librarian accounts, newest first
    pub async fn librarians_list(&self) -> AppResult<Vec<Librarian>> {
        let librarians = sqlx::query_as::<_, Librarian>(&format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY created_at DESC, user_id DESC",
            LIBRARIAN_COLUMNS
        ))
        .bind(Role::Librarian)
        .fetch_all(&self.pool)
        .await?;
        Ok(librarians)
    }

    /// Update the given fields of a librarian account
    pub async fn librarians_update(
        &self,
        user_id: i32,
        data: &UpdateLibrarian,
        password_hash: Option<&str>,
    ) -> AppResult<Librarian> {
        sqlx::query_as::<_, Librarian>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE user_id = $1 AND role = $6
            RETURNING {}
            "#,
            LIBRARIAN_COLUMNS
        ))
        .bind(user_id)
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(password_hash)
        .bind(Role::Librarian)
        .fetch_optional(&self.pool)
        .await
        .map_err(user_conflict)?
        .ok_or_else(|| AppError::NotFound(format!("Librarian {} not found", user_id)))
    }

    /// Delete a librarian account that never recorded a transaction
    pub async fn librarians_delete(&self, user_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(Role::Librarian)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(format!("Librarian {} has recorded transactions", user_id))
                } else {
                    AppError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Librarian {} not found", user_id)));
        }
        Ok(())
    }
}
