//! Librarian account management, reserved to admins

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateLibrarian, Librarian, Role, UpdateLibrarian},
    repository::Repository,
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct LibrariansService {
    repository: Repository,
}

impl LibrariansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_librarians(&self) -> AppResult<Vec<Librarian>> {
        self.repository.librarians_list().await
    }

    pub async fn create_librarian(&self, request: CreateLibrarian) -> AppResult<Librarian> {
        let request = request.normalized();
        request.validate()?;

        let hash = hash_password(&request.password)?;
        let librarian = self
            .repository
            .users_create(
                &request.username,
                &request.email,
                request.phone.as_deref(),
                &hash,
                Role::Librarian,
            )
            .await?;

        tracing::info!(user_id = librarian.user_id, username = %librarian.username, "Librarian created");
        Ok(librarian)
    }

    pub async fn update_librarian(&self, user_id: i32, request: UpdateLibrarian) -> AppResult<Librarian> {
        let request = request.normalized();
        if request.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        request.validate()?;

        let hash = request.password.as_deref().map(hash_password).transpose()?;
        let librarian = self
            .repository
            .librarians_update(user_id, &request, hash.as_deref())
            .await?;

        tracing::info!(user_id, password_changed = hash.is_some(), "Librarian updated");
        Ok(librarian)
    }

    pub async fn delete_librarian(&self, user_id: i32) -> AppResult<()> {
        self.repository.librarians_delete(user_id).await?;
        tracing::info!(user_id, "Librarian deleted");
        Ok(())
    }
}
