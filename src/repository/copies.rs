//! Catalog copy domain methods on Repository

use super::{is_unique_violation, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{AddBook, BookSearchResult},
        copy::CopyStatus,
    },
};

impl Repository {
    /// Check a book exists and return its title
    pub async fn books_get_title(&self, isbn: &str) -> AppResult<String> {
        sqlx::query_scalar::<_, String>("SELECT title FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Insert `quantity` Available copies of a book in one transaction
    pub async fn copies_create_batch(&self, isbn: &str, quantity: i32) -> AppResult<Vec<i32>> {
        let mut tx = self.pool.begin().await?;

        let copy_ids = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO book_copies (isbn, status)
            SELECT $1, $2 FROM generate_series(1, $3)
            RETURNING copy_id
            "#,
        )
        .bind(isbn)
        .bind(CopyStatus::Available)
        .bind(quantity)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(copy_ids)
    }

    /// Insert a book and its first copy in one transaction. Returns the copy id.
    pub async fn books_create_with_copy(&self, book: &AddBook) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO books (isbn, title, publication_year, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(book.publication_year)
        .bind(&book.description)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Book with ISBN {} already exists", book.isbn))
            } else {
                AppError::Database(e)
            }
        })?;

        let copy_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO book_copies (isbn, status) VALUES ($1, $2) RETURNING copy_id",
        )
        .bind(&book.isbn)
        .bind(CopyStatus::Available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(copy_id)
    }

    /// Books whose ISBN or title contains `term`, ordered by title
    pub async fn books_search(&self, term: &str, limit: i64) -> AppResult<Vec<BookSearchResult>> {
        let results = sqlx::query_as::<_, BookSearchResult>(
            r#"
            SELECT b.isbn, b.title, b.publication_year,
                   COUNT(c.copy_id) FILTER (WHERE c.status <> $2) AS total_copies,
                   COUNT(c.copy_id) FILTER (WHERE c.status = $3) AS available_copies
            FROM books b
            LEFT JOIN book_copies c ON c.isbn = b.isbn
            WHERE b.isbn ILIKE $1 OR b.title ILIKE $1
            GROUP BY b.isbn
            ORDER BY b.title, b.isbn
            LIMIT $4
            "#,
        )
        .bind(like_pattern(term))
        .bind(CopyStatus::Lost)
        .bind(CopyStatus::Available)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}

/// `%term%` with LIKE wildcards in `term` matched literally
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
