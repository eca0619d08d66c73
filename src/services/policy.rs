//! Circulation policy: borrow/return legality, due dates and overdue fines.
//!
//! Everything here is pure. Persistence and clocks are the caller's job, the
//! policy only sees the state it is handed.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    config::CirculationConfig,
    error::{CirculationError, CirculationResult},
    models::{CopyInfo, CopyStatus, Fine, LatestBorrow},
};

/// Outcome of an allowed borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowDecision {
    pub due_date: NaiveDate,
}

/// Outcome of a return attempt that passed the legality checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnDecision {
    /// The return may be committed. `fine_amount` must be recorded with it.
    Allow { fine_amount: Option<Decimal> },
    /// An unpaid fine blocks the return until a payment is confirmed
    PaymentRequired { fine: Fine, days_overdue: i64 },
}

/// Whole days `on` lies past `due_date`, zero when not overdue.
///
/// Dates are calendar dates, so the ceiling of the elapsed time and the
/// whole-day difference coincide; every overdue figure goes through here.
pub fn days_overdue(due_date: NaiveDate, on: NaiveDate) -> i64 {
    (on - due_date).num_days().max(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CirculationPolicy {
    loan_period_months: u32,
    fine_per_day: Decimal,
}

impl CirculationPolicy {
    pub fn new(loan_period_months: u32, fine_per_day: Decimal) -> Self {
        Self {
            loan_period_months,
            fine_per_day,
        }
    }

    pub fn from_config(config: &CirculationConfig) -> Self {
        Self::new(config.loan_period_months, config.fine_per_day)
    }

    /// Borrow date plus the loan period in calendar months, clamped to the end
    /// of the target month (Oct 31 + 4 months = end of February).
    pub fn default_due_date(&self, borrow_date: NaiveDate) -> NaiveDate {
        borrow_date
            .checked_add_months(Months::new(self.loan_period_months))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Decide whether `copy` may be borrowed on `borrow_date`
    pub fn decide_borrow(
        &self,
        copy: &CopyInfo,
        borrow_date: NaiveDate,
        requested_due_date: Option<NaiveDate>,
    ) -> CirculationResult<BorrowDecision> {
        if copy.status != CopyStatus::Available {
            return Err(CirculationError::CopyUnavailable {
                copy_id: copy.copy_id,
                status: copy.status,
            });
        }

        let due_date = match requested_due_date {
            Some(due_date) if due_date < borrow_date => {
                return Err(CirculationError::InvalidDueDate {
                    borrow_date,
                    due_date,
                });
            }
            Some(due_date) => due_date,
            None => self.default_due_date(borrow_date),
        };

        Ok(BorrowDecision { due_date })
    }

    /// Decide whether the latest borrow of `copy_id` may be closed on `return_date`
    pub fn decide_return(
        &self,
        copy_id: i32,
        latest: Option<&LatestBorrow>,
        existing_fine: Option<&Fine>,
        payment_exists: bool,
        return_date: NaiveDate,
    ) -> CirculationResult<ReturnDecision> {
        let latest = latest.ok_or(CirculationError::NoActiveBorrow(copy_id))?;
        if !latest.is_open() {
            return Err(CirculationError::AlreadyReturned(latest.borrow.borrow_id));
        }

        match existing_fine {
            Some(fine) if !payment_exists => Ok(ReturnDecision::PaymentRequired {
                fine: fine.clone(),
                days_overdue: days_overdue(latest.borrow.due_date, return_date),
            }),
            // Settled fine: never charge the same borrow twice
            Some(_) => Ok(ReturnDecision::Allow { fine_amount: None }),
            None => {
                let amount = self.compute_fine(latest.borrow.due_date, return_date);
                Ok(ReturnDecision::Allow {
                    fine_amount: (amount > Decimal::ZERO).then_some(amount),
                })
            }
        }
    }

    /// Fine owed for returning on `return_date`. Zero unless strictly after the due date.
    pub fn compute_fine(&self, due_date: NaiveDate, return_date: NaiveDate) -> Decimal {
        if return_date <= due_date {
            return Decimal::ZERO;
        }
        let amount = Decimal::from(days_overdue(due_date, return_date)) * self.fine_per_day;
        amount.round_dp(2)
    }
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self::from_config(&CirculationConfig::default())
    }
}
