//! Member domain methods on Repository

use super::{is_unique_violation, Repository};
use crate::{
    error::{AppError, AppResult},
    models::member::{CreateMember, Member},
};

impl Repository {
    /// Get member by ID
    pub async fn members_get_by_id(&self, member_id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            "SELECT member_id, name, email, phone, address, created_at FROM members WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))
    }

    /// Create member
    pub async fn members_create(&self, data: &CreateMember) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (member_id, name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING member_id, name, email, phone, address, created_at
            "#,
        )
        .bind(data.member_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!(
                    "A member with id {} or email {} already exists",
                    data.member_id, data.email
                ))
            } else {
                AppError::Database(e)
            }
        })
    }
}
