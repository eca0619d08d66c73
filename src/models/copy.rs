//! Book copy (physical copy) model and related types

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use super::borrow::OpenBorrowInfo;

/// Circulation status of a single copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CopyStatus {
    Available,
    Borrowed,
    Lost,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "Available",
            CopyStatus::Borrowed => "Borrowed",
            CopyStatus::Lost => "Lost",
        }
    }

    /// Whether the copy lifecycle allows moving from `self` to `next`.
    ///
    /// ```text
    /// Available -> Borrowed   (borrow)
    /// Borrowed  -> Available  (return)
    /// Available -> Lost       (remove / mark lost)
    /// ```
    /// Lost is terminal.
    pub fn can_transition(&self, next: CopyStatus) -> bool {
        matches!(
            (self, next),
            (CopyStatus::Available, CopyStatus::Borrowed)
                | (CopyStatus::Borrowed, CopyStatus::Available)
                | (CopyStatus::Available, CopyStatus::Lost)
        )
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(CopyStatus::Available),
            "Borrowed" => Ok(CopyStatus::Borrowed),
            "Lost" => Ok(CopyStatus::Lost),
            _ => Err(format!("Invalid copy status: {}", s)),
        }
    }
}

// Stored as VARCHAR
impl sqlx::Type<Postgres> for CopyStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for CopyStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for CopyStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Copy row joined with its book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CopyInfo {
    pub copy_id: i32,
    pub isbn: String,
    pub title: String,
    pub status: CopyStatus,
}

/// Status lookup for the librarian desk
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CopyStatusReport {
    pub copy_id: i32,
    pub isbn: String,
    pub title: String,
    pub status: CopyStatus,
    pub is_available: bool,
    pub borrow_info: Option<OpenBorrowInfo>,
}

/// Add copies request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCopies {
    pub isbn: String,
    pub quantity: i32,
}

/// Result of adding copies of a book
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddedCopies {
    pub isbn: String,
    pub copies_added: usize,
    pub copy_ids: Vec<i32>,
}

/// Result of removing (marking lost) a copy
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RemovedCopy {
    pub copy_id: i32,
    pub isbn: String,
    pub previous_status: CopyStatus,
}
