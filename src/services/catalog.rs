//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{AddBook, AddedBook, BookSearchResponse},
        copy::{AddCopies, AddedCopies},
    },
    repository::Repository,
};

/// Upper bound on copies added by one request
pub const MAX_COPIES_PER_BATCH: i32 = 100;

pub const MIN_SEARCH_LENGTH: usize = 2;
const SEARCH_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new book with one Available copy
    pub async fn add_book(&self, request: AddBook) -> AppResult<AddedBook> {
        let request = request.normalized();
        request.validate()?;

        let copy_id = self.repository.books_create_with_copy(&request).await?;
        tracing::info!(isbn = %request.isbn, copy_id, "Book added");

        Ok(AddedBook {
            isbn: request.isbn,
            title: request.title,
            copy_id,
        })
    }

    /// Add Available copies of an existing book
    pub async fn add_copies(&self, request: AddCopies) -> AppResult<AddedCopies> {
        let isbn = validate_add_copies(&request)?;

        let title = self.repository.books_get_title(&isbn).await?;
        let copy_ids = self.repository.copies_create_batch(&isbn, request.quantity).await?;

        tracing::info!("Added {} copies of {} ({})", copy_ids.len(), title, isbn);

        Ok(AddedCopies {
            isbn,
            copies_added: copy_ids.len(),
            copy_ids,
        })
    }

    /// Search books by ISBN or title fragment
    pub async fn search_books(&self, query: &str) -> AppResult<BookSearchResponse> {
        let query = validate_search_query(query)?;
        let results = self.repository.books_search(query, SEARCH_LIMIT).await?;
        tracing::debug!(query, matches = results.len(), "Book search");

        Ok(BookSearchResponse {
            query: query.to_string(),
            count: results.len(),
            results,
        })
    }
}

/// Returns the trimmed query
fn validate_search_query(query: &str) -> AppResult<&str> {
    let query = query.trim();
    if query.chars().count() < MIN_SEARCH_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Search query must be at least {} characters",
            MIN_SEARCH_LENGTH
        )));
    }
    Ok(query)
}

/// Returns the trimmed ISBN
fn validate_add_copies(request: &AddCopies) -> AppResult<String> {
    let isbn = request.isbn.trim();
    if isbn.is_empty() {
        return Err(AppError::Validation("ISBN is required".to_string()));
    }
    if request.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".to_string()));
    }
    if request.quantity > MAX_COPIES_PER_BATCH {
        return Err(AppError::Validation(format!(
            "Cannot add more than {} copies at once",
            MAX_COPIES_PER_BATCH
        )));
    }
    Ok(isbn.to_string())
}
