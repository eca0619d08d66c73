//! Fine and payment models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Fine from database. At most one per borrow transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub fine_id: i32,
    pub borrow_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

/// Payment settling a fine. At most one per fine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub payment_id: i32,
    pub fine_id: i32,
    pub received_by: Option<i32>,
    pub payment_date: DateTime<Utc>,
}

/// A fine with the borrow context a librarian needs to collect it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FineDetails {
    pub fine_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub borrow_id: i32,
    pub copy_id: i32,
    pub title: Option<String>,
    pub member_id: i32,
    pub member_name: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

/// Fine row joined with its borrow and member, as listed per member
#[derive(Debug, Clone, FromRow)]
pub struct FineRow {
    pub fine_id: i32,
    pub amount: Decimal,
    pub borrow_id: i32,
    pub copy_id: i32,
    pub title: Option<String>,
    pub member_id: i32,
    pub member_name: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

/// Open borrow past its due date that has no fine yet
#[derive(Debug, Clone, FromRow)]
pub struct OverdueBorrow {
    pub borrow_id: i32,
    pub copy_id: i32,
    pub member_id: i32,
    pub due_date: NaiveDate,
}

/// Record payment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayFine {
    pub fine_id: i32,
}

/// Outcome of a fine assessment run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssessmentReport {
    pub assessed_on: NaiveDate,
    pub fines_created: usize,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub fine_ids: Vec<i32>,
}
