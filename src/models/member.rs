//! Library member model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Member from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub member_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create member request. The member id is the student id assigned by the library.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(range(min = 1, message = "Member id must be a positive number"))]
    pub member_id: i32,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
}

impl CreateMember {
    /// Trim every text field before validation
    pub fn normalized(self) -> Self {
        Self {
            member_id: self.member_id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateMember {
        CreateMember {
            member_id: 1042,
            name: "  Ada Lovelace ".to_string(),
            email: "ada@example.org".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Analytical Row".to_string(),
        }
    }

    #[test]
    fn test_valid_member() {
        let member = request().normalized();
        assert_eq!(member.name, "Ada Lovelace");
        assert!(member.validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_and_malformed_fields() {
        let mut member = request();
        member.member_id = 0;
        member.email = "not-an-email".to_string();
        member.address = "   ".to_string();

        let errors = member.normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("member_id"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("address"));
        assert!(!fields.contains_key("name"));
    }
}
