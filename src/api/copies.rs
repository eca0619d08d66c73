//! Book and copy endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{AddBook, AddedBook, BookSearchQuery, BookSearchResponse},
        copy::{AddCopies, AddedCopies, CopyStatusReport, RemovedCopy},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Status of a copy and its current borrow
#[utoipa::path(
    get,
    path = "/copies/{id}/status",
    tag = "copies",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy status", body = CopyStatusReport),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn copy_status(
    State(state): State<AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
    Path(copy_id): Path<i32>,
) -> AppResult<Json<CopyStatusReport>> {
    let report = state.services.circulation.copy_status(copy_id).await?;
    Ok(Json(report))
}

/// Remove a copy from circulation (marks it Lost)
#[utoipa::path(
    post,
    path = "/copies/{id}/remove",
    tag = "copies",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy removed", body = RemovedCopy),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy is borrowed or already lost", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_copy(
    State(state): State<AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
    Path(copy_id): Path<i32>,
) -> AppResult<Json<RemovedCopy>> {
    let removed = state.services.circulation.remove_copy(copy_id).await?;
    Ok(Json(removed))
}

/// Add copies of an existing book
#[utoipa::path(
    post,
    path = "/copies",
    tag = "copies",
    security(("bearer_auth" = [])),
    request_body = AddCopies,
    responses(
        (status = 201, description = "Copies added", body = AddedCopies),
        (status = 400, description = "Invalid quantity or ISBN", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_copies(
    State(state): State<AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
    Json(request): Json<AddCopies>,
) -> AppResult<(StatusCode, Json<AddedCopies>)> {
    let added = state.services.catalog.add_copies(request).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// Add a book with its first copy
#[utoipa::path(
    post,
    path = "/books",
    tag = "copies",
    security(("bearer_auth" = [])),
    request_body = AddBook,
    responses(
        (status = 201, description = "Book added", body = AddedBook),
        (status = 400, description = "Invalid book data", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
    Json(request): Json<AddBook>,
) -> AppResult<(StatusCode, Json<AddedBook>)> {
    let added = state.services.catalog.add_book(request).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// Search books by ISBN or title
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "copies",
    security(("bearer_auth" = [])),
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = BookSearchResponse),
        (status = 400, description = "Query shorter than 2 characters", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<BookSearchResponse>> {
    let response = state.services.catalog.search_books(&query.q).await?;
    Ok(Json(response))
}
