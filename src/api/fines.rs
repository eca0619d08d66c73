//! Fine payment endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{fine::{AssessmentReport, PayFine}, FineDetails, Payment},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UnpaidFinesQuery {
    pub member_id: i32,
}

#[derive(Serialize, ToSchema)]
pub struct UnpaidFinesResponse {
    pub member_id: i32,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub unpaid_fines: Vec<FineDetails>,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentResponse {
    pub success: bool,
    pub payment: Payment,
}

/// Unpaid fines of a member
#[utoipa::path(
    get,
    path = "/payments",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(UnpaidFinesQuery),
    responses(
        (status = 200, description = "Unpaid fines", body = UnpaidFinesResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_unpaid_fines(
    State(state): State<AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
    Query(query): Query<UnpaidFinesQuery>,
) -> AppResult<Json<UnpaidFinesResponse>> {
    let unpaid_fines = state
        .services
        .circulation
        .member_unpaid_fines(query.member_id)
        .await?;

    Ok(Json(UnpaidFinesResponse {
        member_id: query.member_id,
        total_amount: unpaid_fines.iter().map(|fine| fine.amount).sum(),
        unpaid_fines,
    }))
}

/// Record a fine payment
#[utoipa::path(
    post,
    path = "/payments",
    tag = "fines",
    security(("bearer_auth" = [])),
    request_body = PayFine,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 404, description = "Fine not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Fine already paid", body = crate::error::ErrorResponse)
    )
)]
pub async fn pay_fine(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(request): Json<PayFine>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    let payment = state.services.circulation.pay_fine(&ctx, request.fine_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            success: true,
            payment,
        }),
    ))
}

/// Record fines for open overdue borrows (admin)
#[utoipa::path(
    post,
    path = "/fines/assess",
    tag = "fines",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assessment report", body = AssessmentReport),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn assess_overdue_fines(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> AppResult<Json<AssessmentReport>> {
    ctx.require_admin()?;
    let report = state.services.circulation.assess_overdue_fines().await?;
    Ok(Json(report))
}
