//! Persistence contract of the circulation core.
//!
//! Every `*_atomic` method commits all of its rows in one database
//! transaction or none of them, so a failed call is safe to retry.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    error::CirculationResult,
    models::{
        borrow::ReturnReceipt,
        fine::{FineRow, OverdueBorrow},
        BorrowTransaction, CopyInfo, Fine, LatestBorrow, Member, Payment,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CirculationGateway: Send + Sync {
    /// Copy with its book. Fails with `NotFound` when the copy does not exist.
    async fn get_copy_status(&self, copy_id: i32) -> CirculationResult<CopyInfo>;

    async fn get_member(&self, member_id: i32) -> CirculationResult<Option<Member>>;

    /// Most recent borrow of the copy, returned or not
    async fn get_latest_borrow(&self, copy_id: i32) -> CirculationResult<Option<LatestBorrow>>;

    /// Borrow of the copy that has no return yet
    async fn get_open_borrow(&self, copy_id: i32) -> CirculationResult<Option<BorrowTransaction>> {
        Ok(self
            .get_latest_borrow(copy_id)
            .await?
            .filter(LatestBorrow::is_open)
            .map(|latest| latest.borrow))
    }

    async fn get_fine(&self, fine_id: i32) -> CirculationResult<Option<Fine>>;

    async fn get_fine_for_borrow(&self, borrow_id: i32) -> CirculationResult<Option<Fine>>;

    async fn has_payment(&self, fine_id: i32) -> CirculationResult<bool>;

    /// Insert the borrow and flip the copy to Borrowed. The copy is re-checked
    /// under a row lock: a concurrent loser gets `CopyUnavailable`.
    async fn insert_borrow_atomic(
        &self,
        member_id: i32,
        copy_id: i32,
        librarian_id: Option<i32>,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> CirculationResult<i32>;

    /// Insert the return, flip the copy to Available and, when `fine_amount`
    /// is positive, insert the fine. Under the borrow row lock it fails with
    /// `AlreadyReturned` if a return exists and with `PaymentRequired` if the
    /// borrow carries an unpaid fine.
    async fn insert_return_atomic(
        &self,
        borrow_id: i32,
        librarian_id: Option<i32>,
        return_date: NaiveDate,
        fine_amount: Option<Decimal>,
    ) -> CirculationResult<ReturnReceipt>;

    /// Fails with `AlreadyPaid` when a payment exists, `NotFound` when the fine does not.
    async fn insert_payment(&self, fine_id: i32, librarian_id: Option<i32>) -> CirculationResult<Payment>;

    /// Record a fine for a still-open borrow, serialized with returns on the
    /// borrow row. `None` when the borrow is returned or already fined.
    async fn insert_fine(&self, borrow_id: i32, amount: Decimal) -> CirculationResult<Option<i32>>;

    /// Open borrows due before `today` without a fine
    async fn list_overdue_unfined(&self, today: NaiveDate) -> CirculationResult<Vec<OverdueBorrow>>;

    async fn list_unpaid_fines(&self, member_id: i32) -> CirculationResult<Vec<FineRow>>;

    /// Available -> Lost. `false` when the copy was no longer Available.
    async fn mark_copy_lost(&self, copy_id: i32) -> CirculationResult<bool>;
}
