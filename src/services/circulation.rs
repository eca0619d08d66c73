//! Circulation service: sequences policy decisions with atomic gateway writes

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{CirculationError, CirculationResult},
    models::{
        borrow::OpenBorrowInfo,
        copy::{CopyStatusReport, RemovedCopy},
        fine::{AssessmentReport, FineRow},
        BorrowRecord, BorrowRequest, CopyInfo, CopyStatus, Fine, FineDetails, LatestBorrow, Payment,
        RequestContext, ReturnRecord, ReturnRequest,
    },
    repository::CirculationGateway,
};

use super::policy::{days_overdue, CirculationPolicy, ReturnDecision};

/// Source of the current calendar date
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Result of a return attempt
#[derive(Debug, Clone)]
pub enum ReturnOutcome {
    Returned(ReturnRecord),
    /// Nothing was written; pay the fine and call again with `confirm_payment`
    PaymentRequired(FineDetails),
}

#[derive(Clone)]
pub struct CirculationService {
    gateway: Arc<dyn CirculationGateway>,
    policy: CirculationPolicy,
    today: Clock,
}

impl CirculationService {
    pub fn new(gateway: Arc<dyn CirculationGateway>, policy: CirculationPolicy) -> Self {
        Self {
            gateway,
            policy,
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replace the clock, mostly for tests and backdated batch runs
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    /// Borrow a copy for a member
    pub async fn borrow(&self, ctx: &RequestContext, request: BorrowRequest) -> CirculationResult<BorrowRecord> {
        let today = self.today();

        let copy = self.gateway.get_copy_status(request.copy_id).await?;
        self.gateway
            .get_member(request.member_id)
            .await?
            .ok_or_else(|| CirculationError::NotFound(format!("Member {} not found", request.member_id)))?;

        let decision = self.policy.decide_borrow(&copy, today, request.due_date)?;

        let borrow_id = self
            .gateway
            .insert_borrow_atomic(
                request.member_id,
                request.copy_id,
                Some(ctx.user_id),
                today,
                decision.due_date,
            )
            .await?;

        tracing::info!(
            borrow_id,
            copy_id = request.copy_id,
            member_id = request.member_id,
            librarian_id = ctx.user_id,
            due_date = %decision.due_date,
            "Copy borrowed"
        );

        Ok(BorrowRecord {
            borrow_id,
            copy_id: request.copy_id,
            member_id: request.member_id,
            borrow_date: today,
            due_date: decision.due_date,
        })
    }

    /// Return a copy. An unpaid fine blocks the return unless the same call
    /// confirms its payment.
    pub async fn return_copy(&self, ctx: &RequestContext, request: ReturnRequest) -> CirculationResult<ReturnOutcome> {
        let today = self.today();
        let copy_id = request.copy_id;

        let copy = self.gateway.get_copy_status(copy_id).await?;
        let latest = self.gateway.get_latest_borrow(copy_id).await?;
        let fine = match &latest {
            Some(latest) => self.gateway.get_fine_for_borrow(latest.borrow.borrow_id).await?,
            None => None,
        };
        let payment_exists = match &fine {
            Some(fine) => self.gateway.has_payment(fine.fine_id).await?,
            None => false,
        };

        let decision = self
            .policy
            .decide_return(copy_id, latest.as_ref(), fine.as_ref(), payment_exists, today)?;
        let latest = latest.ok_or(CirculationError::NoActiveBorrow(copy_id))?;
        let borrow_id = latest.borrow.borrow_id;

        let confirm_payment = request.confirm_payment.unwrap_or(false);
        let mut payment_id = None;
        if confirm_payment {
            if let Some(fine_id) = request.fine_id {
                if fine.as_ref().map(|f| f.fine_id) != Some(fine_id) {
                    return Err(match self.gateway.get_fine(fine_id).await? {
                        Some(_) => CirculationError::FineMismatch { fine_id, borrow_id },
                        None => CirculationError::NotFound(format!("Fine {} not found", fine_id)),
                    });
                }
                let payment = self.gateway.insert_payment(fine_id, Some(ctx.user_id)).await?;
                tracing::info!(fine_id, payment_id = payment.payment_id, "Fine paid at return desk");
                payment_id = Some(payment.payment_id);
            }
        }

        let fine_amount = match decision {
            ReturnDecision::PaymentRequired { fine, .. } if confirm_payment && payment_id.is_none() => {
                return Err(CirculationError::FineIdRequired { fine_id: fine.fine_id });
            }
            ReturnDecision::PaymentRequired { fine, days_overdue } if payment_id.is_none() => {
                tracing::info!(
                    copy_id,
                    borrow_id,
                    fine_id = fine.fine_id,
                    amount = %fine.amount,
                    "Return blocked by unpaid fine"
                );
                let details = self.fine_details(&latest, &copy, fine, days_overdue).await?;
                return Ok(ReturnOutcome::PaymentRequired(details));
            }
            ReturnDecision::PaymentRequired { .. } => None,
            ReturnDecision::Allow { fine_amount } => fine_amount,
        };

        let receipt = match self
            .gateway
            .insert_return_atomic(borrow_id, Some(ctx.user_id), today, fine_amount)
            .await
        {
            Ok(receipt) => receipt,
            Err(CirculationError::PaymentRequired { fine_id, .. }) => {
                // Fine assessed between the reads above and the return write
                let fine = self
                    .gateway
                    .get_fine(fine_id)
                    .await?
                    .ok_or_else(|| CirculationError::NotFound(format!("Fine {} not found", fine_id)))?;
                tracing::info!(copy_id, borrow_id, fine_id, "Return blocked by a fine assessed concurrently");
                let overdue = days_overdue(latest.borrow.due_date, today);
                let details = self.fine_details(&latest, &copy, fine, overdue).await?;
                return Ok(ReturnOutcome::PaymentRequired(details));
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            return_id = receipt.return_id,
            borrow_id,
            copy_id,
            fine_id = ?receipt.fine_id,
            "Copy returned"
        );

        Ok(ReturnOutcome::Returned(ReturnRecord {
            return_id: receipt.return_id,
            borrow_id,
            copy_id,
            return_date: today,
            fine_id: receipt.fine_id,
            fine_amount: receipt.fine_id.and(fine_amount),
            payment_id,
        }))
    }

    /// Record the payment of a fine outside of a return
    pub async fn pay_fine(&self, ctx: &RequestContext, fine_id: i32) -> CirculationResult<Payment> {
        let payment = self.gateway.insert_payment(fine_id, Some(ctx.user_id)).await?;
        tracing::info!(fine_id, payment_id = payment.payment_id, librarian_id = ctx.user_id, "Fine paid");
        Ok(payment)
    }

    /// Unpaid fines of a member, oldest first
    pub async fn member_unpaid_fines(&self, member_id: i32) -> CirculationResult<Vec<FineDetails>> {
        self.gateway
            .get_member(member_id)
            .await?
            .ok_or_else(|| CirculationError::NotFound(format!("Member {} not found", member_id)))?;

        let today = self.today();
        let rows = self.gateway.list_unpaid_fines(member_id).await?;
        Ok(rows.into_iter().map(|row| unpaid_fine_details(row, today)).collect())
    }

    /// Record fines for every open borrow already past its due date.
    /// Borrows that already carry a fine are left alone, so reruns are harmless.
    pub async fn assess_overdue_fines(&self) -> CirculationResult<AssessmentReport> {
        let today = self.today();
        let overdue = self.gateway.list_overdue_unfined(today).await?;

        let mut report = AssessmentReport {
            assessed_on: today,
            fines_created: 0,
            total_amount: Decimal::ZERO,
            fine_ids: Vec::new(),
        };

        for borrow in overdue {
            let amount = self.policy.compute_fine(borrow.due_date, today);
            if amount <= Decimal::ZERO {
                continue;
            }
            if let Some(fine_id) = self.gateway.insert_fine(borrow.borrow_id, amount).await? {
                tracing::debug!(fine_id, borrow_id = borrow.borrow_id, %amount, "Fine assessed");
                report.fines_created += 1;
                report.total_amount += amount;
                report.fine_ids.push(fine_id);
            }
        }

        tracing::info!(
            fines_created = report.fines_created,
            total = %report.total_amount,
            "Overdue fine assessment completed"
        );
        Ok(report)
    }

    /// Status of a copy, with the open borrow if any
    pub async fn copy_status(&self, copy_id: i32) -> CirculationResult<CopyStatusReport> {
        let copy = self.gateway.get_copy_status(copy_id).await?;

        let borrow_info = match self.gateway.get_open_borrow(copy_id).await? {
            Some(borrow) => {
                let member = self.gateway.get_member(borrow.member_id).await?;
                Some(OpenBorrowInfo {
                    borrow_id: borrow.borrow_id,
                    borrow_date: borrow.borrow_date,
                    due_date: borrow.due_date,
                    member_id: borrow.member_id,
                    member_name: member.as_ref().map(|m| m.name.clone()).unwrap_or_else(|| "Unknown".to_string()),
                    member_email: member.map(|m| m.email).unwrap_or_else(|| "Unknown".to_string()),
                    days_overdue: days_overdue(borrow.due_date, self.today()),
                })
            }
            None => None,
        };

        Ok(CopyStatusReport {
            copy_id: copy.copy_id,
            is_available: copy.status == CopyStatus::Available,
            isbn: copy.isbn,
            title: copy.title,
            status: copy.status,
            borrow_info,
        })
    }

    /// Take a copy out of circulation (Available -> Lost)
    pub async fn remove_copy(&self, copy_id: i32) -> CirculationResult<RemovedCopy> {
        let copy = self.gateway.get_copy_status(copy_id).await?;
        if !copy.status.can_transition(CopyStatus::Lost) {
            return Err(removal_refused(copy_id, copy.status));
        }

        if !self.gateway.mark_copy_lost(copy_id).await? {
            // Lost the race against a borrow or another removal
            let current = self.gateway.get_copy_status(copy_id).await?;
            return Err(removal_refused(copy_id, current.status));
        }

        tracing::info!(copy_id, isbn = %copy.isbn, "Copy removed from circulation");
        Ok(RemovedCopy {
            copy_id,
            isbn: copy.isbn,
            previous_status: copy.status,
        })
    }

    async fn fine_details(
        &self,
        latest: &LatestBorrow,
        copy: &CopyInfo,
        fine: Fine,
        days_overdue: i64,
    ) -> CirculationResult<FineDetails> {
        let member_name = self
            .gateway
            .get_member(latest.borrow.member_id)
            .await?
            .map(|m| m.name)
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(FineDetails {
            fine_id: fine.fine_id,
            amount: fine.amount,
            borrow_id: latest.borrow.borrow_id,
            copy_id: copy.copy_id,
            title: Some(copy.title.clone()),
            member_id: latest.borrow.member_id,
            member_name,
            borrow_date: latest.borrow.borrow_date,
            due_date: latest.borrow.due_date,
            days_overdue,
        })
    }
}

fn removal_refused(copy_id: i32, status: CopyStatus) -> CirculationError {
    match status {
        CopyStatus::Lost => CirculationError::AlreadyLost(copy_id),
        status => CirculationError::CopyUnavailable { copy_id, status },
    }
}

fn unpaid_fine_details(row: FineRow, today: NaiveDate) -> FineDetails {
    FineDetails {
        fine_id: row.fine_id,
        amount: row.amount,
        borrow_id: row.borrow_id,
        copy_id: row.copy_id,
        title: row.title,
        member_id: row.member_id,
        member_name: row.member_name,
        borrow_date: row.borrow_date,
        due_date: row.due_date,
        days_overdue: days_overdue(row.due_date, row.return_date.unwrap_or(today)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{borrow::ReturnReceipt, fine::OverdueBorrow, BorrowTransaction, Member, Role};
    use crate::repository::gateway::MockCirculationGateway;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext { user_id: 2, role: Role::Librarian }
    }

    fn copy(status: CopyStatus) -> CopyInfo {
        CopyInfo {
            copy_id: 11,
            isbn: "9780140449136".to_string(),
            title: "Crime and Punishment".to_string(),
            status,
        }
    }

    fn member() -> Member {
        Member {
            member_id: 1042,
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            phone: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    fn latest(due_date: NaiveDate, return_id: Option<i32>) -> LatestBorrow {
        LatestBorrow {
            borrow: BorrowTransaction {
                borrow_id: 5,
                member_id: 1042,
                copy_id: 11,
                librarian_id: Some(2),
                borrow_date: date(2023, 9, 1),
                due_date,
            },
            return_id,
        }
    }

    fn payment(fine_id: i32) -> Payment {
        Payment {
            payment_id: 40,
            fine_id,
            received_by: Some(2),
            payment_date: Utc::now(),
        }
    }

    fn service(gateway: MockCirculationGateway, today: NaiveDate) -> CirculationService {
        CirculationService::new(Arc::new(gateway), CirculationPolicy::default()).with_clock(move || today)
    }

    /// Gateway with an open borrow of copy 11, due 2024-01-01
    fn open_borrow_gateway(fine: Option<Fine>, paid: bool) -> MockCirculationGateway {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .with(eq(11))
            .returning(|_| Ok(copy(CopyStatus::Borrowed)));
        gateway
            .expect_get_latest_borrow()
            .with(eq(11))
            .returning(|_| Ok(Some(latest(date(2024, 1, 1), None))));
        gateway
            .expect_get_fine_for_borrow()
            .with(eq(5))
            .returning(move |_| Ok(fine.clone()));
        gateway.expect_has_payment().returning(move |_| Ok(paid));
        gateway.expect_get_member().returning(|_| Ok(Some(member())));
        gateway
    }

    #[tokio::test]
    async fn test_borrow_uses_default_due_date() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Available)));
        gateway.expect_get_member().with(eq(1042)).returning(|_| Ok(Some(member())));
        gateway
            .expect_insert_borrow_atomic()
            .with(eq(1042), eq(11), eq(Some(2)), eq(date(2024, 6, 30)), eq(date(2024, 10, 30)))
            .times(1)
            .returning(|_, _, _, _, _| Ok(77));

        let record = service(gateway, date(2024, 6, 30))
            .borrow(&ctx(), BorrowRequest { copy_id: 11, member_id: 1042, due_date: None })
            .await
            .unwrap();

        assert_eq!(record.borrow_id, 77);
        assert_eq!(record.due_date, date(2024, 10, 30));
    }

    #[tokio::test]
    async fn test_borrow_of_unavailable_copy_writes_nothing() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Borrowed)));
        gateway.expect_get_member().returning(|_| Ok(Some(member())));
        gateway.expect_insert_borrow_atomic().never();

        let err = service(gateway, date(2024, 6, 30))
            .borrow(&ctx(), BorrowRequest { copy_id: 11, member_id: 1042, due_date: None })
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::CopyUnavailable { copy_id: 11, .. }));
    }

    #[tokio::test]
    async fn test_borrow_race_loser_gets_copy_unavailable() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Available)));
        gateway.expect_get_member().returning(|_| Ok(Some(member())));
        gateway.expect_insert_borrow_atomic().returning(|_, copy_id, _, _, _| {
            Err(CirculationError::CopyUnavailable { copy_id, status: CopyStatus::Borrowed })
        });

        let err = service(gateway, date(2024, 6, 30))
            .borrow(&ctx(), BorrowRequest { copy_id: 11, member_id: 1042, due_date: None })
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::CopyUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_borrow_for_unknown_member() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Available)));
        gateway.expect_get_member().returning(|_| Ok(None));
        gateway.expect_insert_borrow_atomic().never();

        let err = service(gateway, date(2024, 6, 30))
            .borrow(&ctx(), BorrowRequest { copy_id: 11, member_id: 9, due_date: None })
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_late_return_records_fine_with_return() {
        let mut gateway = open_borrow_gateway(None, false);
        gateway
            .expect_insert_return_atomic()
            .with(eq(5), eq(Some(2)), eq(date(2024, 1, 11)), eq(Some(dec!(10.00))))
            .times(1)
            .returning(|_, _, _, _| Ok(ReturnReceipt { return_id: 8, fine_id: Some(3) }));

        let outcome = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, ..Default::default() })
            .await
            .unwrap();

        let ReturnOutcome::Returned(record) = outcome else {
            panic!("expected a completed return");
        };
        assert_eq!(record.return_id, 8);
        assert_eq!(record.fine_id, Some(3));
        assert_eq!(record.fine_amount, Some(dec!(10.00)));
        assert_eq!(record.payment_id, None);
    }

    #[tokio::test]
    async fn test_unpaid_fine_blocks_return() {
        let fine = Fine { fine_id: 3, borrow_id: 5, amount: dec!(10.00) };
        let mut gateway = open_borrow_gateway(Some(fine), false);
        gateway.expect_insert_return_atomic().never();
        gateway.expect_insert_payment().never();

        let outcome = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, ..Default::default() })
            .await
            .unwrap();

        let ReturnOutcome::PaymentRequired(details) = outcome else {
            panic!("expected the return to be blocked");
        };
        assert_eq!(details.fine_id, 3);
        assert_eq!(details.amount, dec!(10.00));
        assert_eq!(details.days_overdue, 10);
        assert_eq!(details.member_name, "Ada Lovelace");
        assert_eq!(details.due_date, date(2024, 1, 1));
    }

    #[tokio::test]
    async fn test_confirmed_payment_completes_return() {
        let fine = Fine { fine_id: 3, borrow_id: 5, amount: dec!(10.00) };
        let mut gateway = open_borrow_gateway(Some(fine), false);
        gateway
            .expect_insert_payment()
            .with(eq(3), eq(Some(2)))
            .times(1)
            .returning(|fine_id, _| Ok(payment(fine_id)));
        gateway
            .expect_insert_return_atomic()
            .with(eq(5), eq(Some(2)), eq(date(2024, 1, 11)), eq(None::<Decimal>))
            .times(1)
            .returning(|_, _, _, _| Ok(ReturnReceipt { return_id: 8, fine_id: None }));

        let outcome = service(gateway, date(2024, 1, 11))
            .return_copy(
                &ctx(),
                ReturnRequest { copy_id: 11, confirm_payment: Some(true), fine_id: Some(3) },
            )
            .await
            .unwrap();

        let ReturnOutcome::Returned(record) = outcome else {
            panic!("expected a completed return");
        };
        assert_eq!(record.payment_id, Some(40));
        assert_eq!(record.fine_id, None);
    }

    #[tokio::test]
    async fn test_confirming_a_paid_fine_fails() {
        let fine = Fine { fine_id: 3, borrow_id: 5, amount: dec!(10.00) };
        let mut gateway = open_borrow_gateway(Some(fine), true);
        gateway
            .expect_insert_payment()
            .returning(|fine_id, _| Err(CirculationError::AlreadyPaid(fine_id)));
        gateway.expect_insert_return_atomic().never();

        let err = service(gateway, date(2024, 1, 11))
            .return_copy(
                &ctx(),
                ReturnRequest { copy_id: 11, confirm_payment: Some(true), fine_id: Some(3) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::AlreadyPaid(3)));
    }

    #[tokio::test]
    async fn test_confirming_another_borrows_fine_fails() {
        let fine = Fine { fine_id: 3, borrow_id: 5, amount: dec!(10.00) };
        let mut gateway = open_borrow_gateway(Some(fine), false);
        gateway
            .expect_get_fine()
            .with(eq(99))
            .returning(|fine_id| Ok(Some(Fine { fine_id, borrow_id: 6, amount: dec!(2.50) })));
        gateway.expect_insert_payment().never();
        gateway.expect_insert_return_atomic().never();

        let err = service(gateway, date(2024, 1, 11))
            .return_copy(
                &ctx(),
                ReturnRequest { copy_id: 11, confirm_payment: Some(true), fine_id: Some(99) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::FineMismatch { fine_id: 99, borrow_id: 5 }));
    }

    #[tokio::test]
    async fn test_confirming_an_unknown_fine_is_not_found() {
        let fine = Fine { fine_id: 3, borrow_id: 5, amount: dec!(10.00) };
        let mut gateway = open_borrow_gateway(Some(fine), false);
        gateway.expect_get_fine().with(eq(999)).returning(|_| Ok(None));
        gateway.expect_insert_payment().never();
        gateway.expect_insert_return_atomic().never();

        let err = service(gateway, date(2024, 1, 11))
            .return_copy(
                &ctx(),
                ReturnRequest { copy_id: 11, confirm_payment: Some(true), fine_id: Some(999) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_confirming_without_fine_id_is_rejected() {
        let fine = Fine { fine_id: 3, borrow_id: 5, amount: dec!(10.00) };
        let mut gateway = open_borrow_gateway(Some(fine), false);
        gateway.expect_insert_payment().never();
        gateway.expect_insert_return_atomic().never();

        let err = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, confirm_payment: Some(true), fine_id: None })
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::FineIdRequired { fine_id: 3 }));
    }

    #[tokio::test]
    async fn test_confirm_without_fine_id_is_harmless_when_nothing_is_owed() {
        let mut gateway = open_borrow_gateway(None, false);
        gateway
            .expect_insert_return_atomic()
            .returning(|_, _, _, _| Ok(ReturnReceipt { return_id: 8, fine_id: Some(3) }));

        let outcome = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, confirm_payment: Some(true), fine_id: None })
            .await
            .unwrap();

        assert!(matches!(outcome, ReturnOutcome::Returned(_)));
    }

    #[tokio::test]
    async fn test_fine_assessed_during_return_blocks_it() {
        let mut gateway = open_borrow_gateway(None, false);
        gateway
            .expect_insert_return_atomic()
            .times(1)
            .returning(|borrow_id, _, _, _| Err(CirculationError::PaymentRequired { fine_id: 3, borrow_id }));
        gateway
            .expect_get_fine()
            .with(eq(3))
            .returning(|_| Ok(Some(Fine { fine_id: 3, borrow_id: 5, amount: dec!(9.50) })));

        let outcome = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, ..Default::default() })
            .await
            .unwrap();

        let ReturnOutcome::PaymentRequired(details) = outcome else {
            panic!("expected the return to be blocked");
        };
        assert_eq!(details.fine_id, 3);
        assert_eq!(details.amount, dec!(9.50));
        assert_eq!(details.days_overdue, 10);
    }

    #[tokio::test]
    async fn test_return_without_borrow() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Available)));
        gateway.expect_get_latest_borrow().returning(|_| Ok(None));
        gateway.expect_insert_return_atomic().never();

        let err = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, ..Default::default() })
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::NoActiveBorrow(11)));
    }

    #[tokio::test]
    async fn test_second_return_fails() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Available)));
        gateway
            .expect_get_latest_borrow()
            .returning(|_| Ok(Some(latest(date(2024, 1, 1), Some(8)))));
        gateway.expect_get_fine_for_borrow().returning(|_| Ok(None));
        gateway.expect_insert_return_atomic().never();

        let err = service(gateway, date(2024, 1, 11))
            .return_copy(&ctx(), ReturnRequest { copy_id: 11, ..Default::default() })
            .await
            .unwrap_err();

        assert!(matches!(err, CirculationError::AlreadyReturned(5)));
    }

    #[tokio::test]
    async fn test_remove_borrowed_copy_is_refused() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Borrowed)));
        gateway.expect_mark_copy_lost().never();

        let err = service(gateway, date(2024, 1, 11)).remove_copy(11).await.unwrap_err();
        assert!(matches!(err, CirculationError::CopyUnavailable { status: CopyStatus::Borrowed, .. }));
    }

    #[tokio::test]
    async fn test_remove_lost_race() {
        let mut gateway = MockCirculationGateway::new();
        let mut seq = mockall::Sequence::new();
        gateway
            .expect_get_copy_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(copy(CopyStatus::Available)));
        gateway.expect_mark_copy_lost().times(1).in_sequence(&mut seq).returning(|_| Ok(false));
        gateway
            .expect_get_copy_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(copy(CopyStatus::Lost)));

        let err = service(gateway, date(2024, 1, 11)).remove_copy(11).await.unwrap_err();
        assert!(matches!(err, CirculationError::AlreadyLost(11)));
    }

    #[tokio::test]
    async fn test_assessment_skips_already_fined_borrows() {
        let mut gateway = MockCirculationGateway::new();
        gateway.expect_list_overdue_unfined().returning(|_| {
            Ok(vec![
                OverdueBorrow { borrow_id: 5, copy_id: 11, member_id: 1042, due_date: date(2024, 1, 1) },
                OverdueBorrow { borrow_id: 6, copy_id: 12, member_id: 1042, due_date: date(2024, 1, 6) },
            ])
        });
        gateway
            .expect_insert_fine()
            .with(eq(5), eq(dec!(10.00)))
            .returning(|_, _| Ok(Some(3)));
        // Fined concurrently by another run
        gateway
            .expect_insert_fine()
            .with(eq(6), eq(dec!(5.00)))
            .returning(|_, _| Ok(None));

        let report = service(gateway, date(2024, 1, 11)).assess_overdue_fines().await.unwrap();
        assert_eq!(report.fines_created, 1);
        assert_eq!(report.fine_ids, vec![3]);
        assert_eq!(report.total_amount, dec!(10.00));
    }

    #[tokio::test]
    async fn test_copy_status_reports_open_borrow() {
        let mut gateway = MockCirculationGateway::new();
        gateway
            .expect_get_copy_status()
            .returning(|_| Ok(copy(CopyStatus::Borrowed)));
        gateway.expect_get_open_borrow().returning(|_| Ok(Some(latest(date(2024, 1, 1), None).borrow)));
        gateway.expect_get_member().returning(|_| Ok(Some(member())));

        let report = service(gateway, date(2024, 1, 4)).copy_status(11).await.unwrap();
        assert!(!report.is_available);
        let info = report.borrow_info.unwrap();
        assert_eq!(info.member_email, "ada@example.org");
        assert_eq!(info.days_overdue, 3);
    }
}
