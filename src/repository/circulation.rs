//! PostgreSQL implementation of the circulation gateway

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{CirculationError, CirculationResult},
    models::{
        borrow::ReturnReceipt,
        fine::{FineRow, OverdueBorrow},
        CopyInfo, CopyStatus, Fine, LatestBorrow, Member, Payment,
    },
};

use super::gateway::CirculationGateway;

#[derive(Clone)]
pub struct PgCirculationGateway {
    pool: Pool<Postgres>,
}

impl PgCirculationGateway {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CirculationGateway for PgCirculationGateway {
    async fn get_copy_status(&self, copy_id: i32) -> CirculationResult<CopyInfo> {
        sqlx::query_as::<_, CopyInfo>(
            r#"
            SELECT c.copy_id, c.isbn, b.title, c.status
            FROM book_copies c
            JOIN books b ON b.isbn = c.isbn
            WHERE c.copy_id = $1
            "#,
        )
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CirculationError::NotFound(format!("Book copy {} not found", copy_id)))
    }

    async fn get_member(&self, member_id: i32) -> CirculationResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT member_id, name, email, phone, address, created_at FROM members WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn get_latest_borrow(&self, copy_id: i32) -> CirculationResult<Option<LatestBorrow>> {
        let latest = sqlx::query_as::<_, LatestBorrow>(
            r#"
            SELECT b.borrow_id, b.member_id, b.copy_id, b.librarian_id,
                   b.borrow_date, b.due_date, r.return_id
            FROM borrow_transactions b
            LEFT JOIN return_transactions r ON r.borrow_id = b.borrow_id
            WHERE b.copy_id = $1
            ORDER BY b.borrow_date DESC, b.borrow_id DESC
            LIMIT 1
            "#,
        )
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(latest)
    }

    async fn get_fine(&self, fine_id: i32) -> CirculationResult<Option<Fine>> {
        let fine = sqlx::query_as::<_, Fine>("SELECT fine_id, borrow_id, amount FROM fines WHERE fine_id = $1")
            .bind(fine_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(fine)
    }

    async fn get_fine_for_borrow(&self, borrow_id: i32) -> CirculationResult<Option<Fine>> {
        let fine = sqlx::query_as::<_, Fine>("SELECT fine_id, borrow_id, amount FROM fines WHERE borrow_id = $1")
            .bind(borrow_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(fine)
    }

    async fn has_payment(&self, fine_id: i32) -> CirculationResult<bool> {
        let paid: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payments WHERE fine_id = $1)")
            .bind(fine_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(paid)
    }

    async fn insert_borrow_atomic(
        &self,
        member_id: i32,
        copy_id: i32,
        librarian_id: Option<i32>,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> CirculationResult<i32> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent borrows of the same copy
        let status = sqlx::query_scalar::<_, CopyStatus>(
            "SELECT status FROM book_copies WHERE copy_id = $1 FOR UPDATE",
        )
        .bind(copy_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CirculationError::NotFound(format!("Book copy {} not found", copy_id)))?;

        if status != CopyStatus::Available {
            return Err(CirculationError::CopyUnavailable { copy_id, status });
        }

        let borrow_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO borrow_transactions (member_id, copy_id, librarian_id, borrow_date, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING borrow_id
            "#,
        )
        .bind(member_id)
        .bind(copy_id)
        .bind(librarian_id)
        .bind(borrow_date)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE book_copies SET status = $2, updated_at = NOW() WHERE copy_id = $1")
            .bind(copy_id)
            .bind(CopyStatus::Borrowed)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(borrow_id, copy_id, member_id, "Borrow committed");
        Ok(borrow_id)
    }

    async fn insert_return_atomic(
        &self,
        borrow_id: i32,
        librarian_id: Option<i32>,
        return_date: NaiveDate,
        fine_amount: Option<Decimal>,
    ) -> CirculationResult<ReturnReceipt> {
        let mut tx = self.pool.begin().await?;

        let copy_id = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT c.copy_id
            FROM borrow_transactions b
            JOIN book_copies c ON c.copy_id = b.copy_id
            WHERE b.borrow_id = $1
            FOR UPDATE
            "#,
        )
        .bind(borrow_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CirculationError::NotFound(format!("Borrow {} not found", borrow_id)))?;

        let already_returned: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM return_transactions WHERE borrow_id = $1)")
                .bind(borrow_id)
                .fetch_one(&mut *tx)
                .await?;
        if already_returned {
            return Err(CirculationError::AlreadyReturned(borrow_id));
        }

        // A fine assessed after the caller read the borrow state still blocks the return
        let unpaid_fine = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT f.fine_id
            FROM fines f
            LEFT JOIN payments p ON p.fine_id = f.fine_id
            WHERE f.borrow_id = $1 AND p.payment_id IS NULL
            "#,
        )
        .bind(borrow_id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(fine_id) = unpaid_fine {
            return Err(CirculationError::PaymentRequired { fine_id, borrow_id });
        }

        let return_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO return_transactions (borrow_id, librarian_id, return_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (borrow_id) DO NOTHING
            RETURNING return_id
            "#,
        )
        .bind(borrow_id)
        .bind(librarian_id)
        .bind(return_date)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CirculationError::AlreadyReturned(borrow_id))?;

        sqlx::query("UPDATE book_copies SET status = $2, updated_at = NOW() WHERE copy_id = $1")
            .bind(copy_id)
            .bind(CopyStatus::Available)
            .execute(&mut *tx)
            .await?;

        let fine_id = match fine_amount.filter(|amount| *amount > Decimal::ZERO) {
            Some(amount) => {
                sqlx::query_scalar::<_, i32>(
                    r#"
                    INSERT INTO fines (borrow_id, amount)
                    VALUES ($1, $2)
                    ON CONFLICT (borrow_id) DO NOTHING
                    RETURNING fine_id
                    "#,
                )
                .bind(borrow_id)
                .bind(amount)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        tx.commit().await?;

        tracing::debug!(borrow_id, return_id, ?fine_id, "Return committed");
        Ok(ReturnReceipt { return_id, fine_id })
    }

    async fn insert_payment(&self, fine_id: i32, librarian_id: Option<i32>) -> CirculationResult<Payment> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT fine_id FROM fines WHERE fine_id = $1 FOR UPDATE")
            .bind(fine_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CirculationError::NotFound(format!("Fine {} not found", fine_id)))?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (fine_id, received_by, payment_date)
            VALUES ($1, $2, NOW())
            ON CONFLICT (fine_id) DO NOTHING
            RETURNING payment_id, fine_id, received_by, payment_date
            "#,
        )
        .bind(fine_id)
        .bind(librarian_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CirculationError::AlreadyPaid(fine_id))?;

        tx.commit().await?;
        Ok(payment)
    }

    async fn insert_fine(&self, borrow_id: i32, amount: Decimal) -> CirculationResult<Option<i32>> {
        let mut tx = self.pool.begin().await?;

        // Same row lock as insert_return_atomic, so a fine and a return never interleave
        let locked = sqlx::query_scalar::<_, i32>(
            "SELECT borrow_id FROM borrow_transactions WHERE borrow_id = $1 FOR UPDATE",
        )
        .bind(borrow_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let fine_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO fines (borrow_id, amount)
            SELECT $1, $2
            WHERE NOT EXISTS (SELECT 1 FROM return_transactions r WHERE r.borrow_id = $1)
            ON CONFLICT (borrow_id) DO NOTHING
            RETURNING fine_id
            "#,
        )
        .bind(borrow_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(fine_id)
    }

    async fn list_overdue_unfined(&self, today: NaiveDate) -> CirculationResult<Vec<OverdueBorrow>> {
        let overdue = sqlx::query_as::<_, OverdueBorrow>(
            r#"
            SELECT b.borrow_id, b.copy_id, b.member_id, b.due_date
            FROM borrow_transactions b
            WHERE b.due_date < $1
              AND NOT EXISTS (SELECT 1 FROM return_transactions r WHERE r.borrow_id = b.borrow_id)
              AND NOT EXISTS (SELECT 1 FROM fines f WHERE f.borrow_id = b.borrow_id)
            ORDER BY b.due_date, b.borrow_id
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(overdue)
    }

    async fn list_unpaid_fines(&self, member_id: i32) -> CirculationResult<Vec<FineRow>> {
        let fines = sqlx::query_as::<_, FineRow>(
            r#"
            SELECT f.fine_id, f.amount, b.borrow_id, b.copy_id, bk.title,
                   m.member_id, m.name AS member_name,
                   b.borrow_date, b.due_date, r.return_date
            FROM fines f
            JOIN borrow_transactions b ON b.borrow_id = f.borrow_id
            JOIN members m ON m.member_id = b.member_id
            JOIN book_copies c ON c.copy_id = b.copy_id
            LEFT JOIN books bk ON bk.isbn = c.isbn
            LEFT JOIN return_transactions r ON r.borrow_id = b.borrow_id
            WHERE b.member_id = $1
              AND NOT EXISTS (SELECT 1 FROM payments p WHERE p.fine_id = f.fine_id)
            ORDER BY f.created_at, f.fine_id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fines)
    }

    async fn mark_copy_lost(&self, copy_id: i32) -> CirculationResult<bool> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = $2, updated_at = NOW() WHERE copy_id = $1 AND status = $3",
        )
        .bind(copy_id)
        .bind(CopyStatus::Lost)
        .bind(CopyStatus::Available)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
