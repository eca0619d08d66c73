//! Member management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::member::{CreateMember, Member},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new member
    pub async fn add_member(&self, request: CreateMember) -> AppResult<Member> {
        let request = request.normalized();
        request.validate()?;

        let member = self.repository.members_create(&request).await?;
        tracing::info!("Member {} registered", member.member_id);
        Ok(member)
    }

    pub async fn get_member(&self, member_id: i32) -> AppResult<Member> {
        self.repository.members_get_by_id(member_id).await
    }
}
