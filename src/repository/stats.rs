//! Circulation statistics queries

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, Row};
use utoipa::ToSchema;

use super::Repository;
use crate::error::AppResult;

/// Raw counters, one query
#[derive(Debug, Clone)]
pub struct CirculationCounters {
    pub active_borrows: i64,
    pub overdue_borrows: i64,
    pub unpaid_fines: i64,
    pub unpaid_amount: Decimal,
    pub collected_amount: Decimal,
}

/// Borrow count of one title
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TitleCirculation {
    pub isbn: String,
    pub title: String,
    pub borrow_count: i64,
}

/// Fine totals of one member
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MemberFines {
    pub member_id: i32,
    pub name: String,
    pub fine_count: i64,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub unpaid_amount: Decimal,
}

impl Repository {
    pub async fn stats_circulation(&self, today: NaiveDate) -> AppResult<CirculationCounters> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM borrow_transactions b
                 WHERE NOT EXISTS (SELECT 1 FROM return_transactions r WHERE r.borrow_id = b.borrow_id)
                ) AS active_borrows,
                (SELECT COUNT(*) FROM borrow_transactions b
                 WHERE b.due_date < $1
                   AND NOT EXISTS (SELECT 1 FROM return_transactions r WHERE r.borrow_id = b.borrow_id)
                ) AS overdue_borrows,
                (SELECT COUNT(*) FROM fines f
                 WHERE NOT EXISTS (SELECT 1 FROM payments p WHERE p.fine_id = f.fine_id)
                ) AS unpaid_fines,
                (SELECT COALESCE(SUM(f.amount), 0) FROM fines f
                 WHERE NOT EXISTS (SELECT 1 FROM payments p WHERE p.fine_id = f.fine_id)
                ) AS unpaid_amount,
                (SELECT COALESCE(SUM(f.amount), 0) FROM fines f
                 JOIN payments p ON p.fine_id = f.fine_id
                ) AS collected_amount
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(CirculationCounters {
            active_borrows: row.get("active_borrows"),
            overdue_borrows: row.get("overdue_borrows"),
            unpaid_fines: row.get("unpaid_fines"),
            unpaid_amount: row.get("unpaid_amount"),
            collected_amount: row.get("collected_amount"),
        })
    }

    /// Most borrowed titles over all time
    pub async fn stats_top_titles(&self, limit: i64) -> AppResult<Vec<TitleCirculation>> {
        let titles = sqlx::query_as::<_, TitleCirculation>(
            r#"
            SELECT bk.isbn, bk.title, COUNT(*) AS borrow_count
            FROM borrow_transactions b
            JOIN book_copies c ON c.copy_id = b.copy_id
            JOIN books bk ON bk.isbn = c.isbn
            GROUP BY bk.isbn
            ORDER BY borrow_count DESC, bk.title
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    /// Members with the largest fine totals
    pub async fn stats_top_fined_members(&self, limit: i64) -> AppResult<Vec<MemberFines>> {
        let members = sqlx::query_as::<_, MemberFines>(
            r#"
            SELECT m.member_id, m.name,
                   COUNT(f.fine_id) AS fine_count,
                   SUM(f.amount) AS total_amount,
                   COALESCE(SUM(f.amount) FILTER (WHERE p.payment_id IS NULL), 0) AS unpaid_amount
            FROM fines f
            JOIN borrow_transactions b ON b.borrow_id = f.borrow_id
            JOIN members m ON m.member_id = b.member_id
            LEFT JOIN payments p ON p.fine_id = f.fine_id
            GROUP BY m.member_id
            ORDER BY total_amount DESC, m.member_id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}
