//! Statistics service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    repository::{
        stats::{MemberFines, TitleCirculation},
        Repository,
    },
};

/// Length of each ranking in the stats
const TOP_LIMIT: i64 = 10;

/// Circulation counters for the admin dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CirculationStats {
    pub as_of: NaiveDate,
    pub active_borrows: i64,
    pub overdue_borrows: i64,
    pub unpaid_fines: i64,
    #[schema(value_type = String)]
    pub unpaid_amount: Decimal,
    #[schema(value_type = String)]
    pub collected_amount: Decimal,
    pub top_titles: Vec<TitleCirculation>,
    pub top_fined_members: Vec<MemberFines>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Whether the database answers
    pub async fn database_ready(&self) -> bool {
        match self.repository.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                false
            }
        }
    }

    pub async fn circulation_stats(&self, today: NaiveDate) -> AppResult<CirculationStats> {
        let counters = self.repository.stats_circulation(today).await?;
        let top_titles = self.repository.stats_top_titles(TOP_LIMIT).await?;
        let top_fined_members = self.repository.stats_top_fined_members(TOP_LIMIT).await?;
        Ok(CirculationStats {
            as_of: today,
            active_borrows: counters.active_borrows,
            overdue_borrows: counters.overdue_borrows,
            unpaid_fines: counters.unpaid_fines,
            unpaid_amount: counters.unpaid_amount,
            collected_amount: counters.collected_amount,
            top_titles,
            top_fined_members,
        })
    }
}
