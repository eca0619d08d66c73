//! Borrow and return transaction models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Borrow transaction from database. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowTransaction {
    pub borrow_id: i32,
    pub member_id: i32,
    pub copy_id: i32,
    pub librarian_id: Option<i32>,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Most recent borrow of a copy, with its return if one was recorded
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LatestBorrow {
    #[sqlx(flatten)]
    pub borrow: BorrowTransaction,
    pub return_id: Option<i32>,
}

impl LatestBorrow {
    /// A borrow is open until a return exists for it
    pub fn is_open(&self) -> bool {
        self.return_id.is_none()
    }
}

/// Open borrow shown on a copy status lookup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpenBorrowInfo {
    pub borrow_id: i32,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub member_id: i32,
    pub member_name: String,
    pub member_email: String,
    pub days_overdue: i64,
}

/// Result of a successful borrow
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowRecord {
    pub borrow_id: i32,
    pub copy_id: i32,
    pub member_id: i32,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// What the gateway reports after committing a return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnReceipt {
    pub return_id: i32,
    /// Fine created together with the return, if the borrow was overdue
    pub fine_id: Option<i32>,
}

/// Result of a successful return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnRecord {
    pub return_id: i32,
    pub borrow_id: i32,
    pub copy_id: i32,
    pub return_date: NaiveDate,
    /// Set when the return was overdue and a new fine was recorded with it
    pub fine_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub fine_amount: Option<rust_decimal::Decimal>,
    /// Set when `confirm_payment` settled a fine within the same call
    pub payment_id: Option<i32>,
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub copy_id: i32,
    pub member_id: i32,
    /// Defaults to the configured loan period when omitted
    pub due_date: Option<NaiveDate>,
}

/// Return request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub copy_id: i32,
    /// Set on the follow-up call once the member has paid the blocking fine
    pub confirm_payment: Option<bool>,
    pub fine_id: Option<i32>,
}
