//! Book catalog models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Add book request; the book is created with one Available copy
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddBook {
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1 to 20 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 512, message = "Title is required"))]
    pub title: String,
    #[validate(range(min = 1000, max = 9999, message = "Publication year must have four digits"))]
    pub publication_year: Option<i32>,
    pub description: Option<String>,
}

impl AddBook {
    pub fn normalized(self) -> Self {
        Self {
            isbn: self.isbn.trim().to_string(),
            title: self.title.trim().to_string(),
            publication_year: self.publication_year,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddedBook {
    pub isbn: String,
    pub title: String,
    pub copy_id: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Matched against ISBN and title, case-insensitive
    pub q: String,
}

/// A catalog match with its copy counts
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookSearchResult {
    pub isbn: String,
    pub title: String,
    pub publication_year: Option<i32>,
    /// Copies not marked Lost
    pub total_copies: i64,
    pub available_copies: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookSearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<BookSearchResult>,
}
