//! Librarian account endpoints (admin only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{CreateLibrarian, Librarian, UpdateLibrarian},
    AppState,
};

use super::AuthenticatedUser;

/// List librarian accounts
#[utoipa::path(
    get,
    path = "/librarians",
    tag = "librarians",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Librarian accounts", body = Vec<Librarian>),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_librarians(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> AppResult<Json<Vec<Librarian>>> {
    ctx.require_admin()?;

    let librarians = state.services.librarians.list_librarians().await?;
    Ok(Json(librarians))
}

/// Create a librarian account
#[utoipa::path(
    post,
    path = "/librarians",
    tag = "librarians",
    security(("bearer_auth" = [])),
    request_body = CreateLibrarian,
    responses(
        (status = 201, description = "Librarian created", body = Librarian),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(request): Json<CreateLibrarian>,
) -> AppResult<(StatusCode, Json<Librarian>)> {
    ctx.require_admin()?;

    let librarian = state.services.librarians.create_librarian(request).await?;
    Ok((StatusCode::CREATED, Json(librarian)))
}

/// Update a librarian account
#[utoipa::path(
    put,
    path = "/librarians/{id}",
    tag = "librarians",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Librarian user ID")
    ),
    request_body = UpdateLibrarian,
    responses(
        (status = 200, description = "Librarian updated", body = Librarian),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Librarian not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Json(request): Json<UpdateLibrarian>,
) -> AppResult<Json<Librarian>> {
    ctx.require_admin()?;

    let librarian = state.services.librarians.update_librarian(user_id, request).await?;
    Ok(Json(librarian))
}

/// Delete a librarian account
#[utoipa::path(
    delete,
    path = "/librarians/{id}",
    tag = "librarians",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Librarian user ID")
    ),
    responses(
        (status = 204, description = "Librarian deleted"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Librarian not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Librarian has recorded transactions", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<StatusCode> {
    ctx.require_admin()?;

    state.services.librarians.delete_librarian(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
