//! Borrow and return endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorCode},
    models::{BorrowRecord, BorrowRequest, FineDetails, ReturnRecord, ReturnRequest},
    services::circulation::ReturnOutcome,
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub success: bool,
    pub borrow: BorrowRecord,
}

#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub success: bool,
    #[serde(rename = "return")]
    pub return_record: ReturnRecord,
    pub message: String,
}

/// Body of a 402 answer: the return is blocked until the fine is paid
#[derive(Serialize, ToSchema)]
pub struct PaymentRequiredResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    pub fine: FineDetails,
}

/// Borrow a copy
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Copy borrowed", body = BorrowResponse),
        (status = 400, description = "Invalid due date", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy or member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let borrow = state.services.circulation.borrow(&ctx, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            success: true,
            borrow,
        }),
    ))
}

/// Return a copy
#[utoipa::path(
    post,
    path = "/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Copy returned", body = ReturnResponse),
        (status = 400, description = "Confirmed payment without the fine_id of the unpaid fine, or a fine of another borrow", body = crate::error::ErrorResponse),
        (status = 402, description = "Unpaid fine blocks the return", body = PaymentRequiredResponse),
        (status = 404, description = "Copy, borrow or fine not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned or fine already paid", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_copy(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Response> {
    let outcome = state.services.circulation.return_copy(&ctx, request).await?;
    Ok(match outcome {
        ReturnOutcome::Returned(record) => Json(ReturnResponse {
            success: true,
            message: match record.fine_amount {
                Some(amount) => format!("Book returned late, fine of {} recorded", amount),
                None => "Book returned successfully".to_string(),
            },
            return_record: record,
        })
        .into_response(),
        ReturnOutcome::PaymentRequired(fine) => (
            StatusCode::PAYMENT_REQUIRED,
            Json(PaymentRequiredResponse {
                code: ErrorCode::PaymentRequired as u32,
                error: format!("{:?}", ErrorCode::PaymentRequired),
                message: format!(
                    "Member must pay fine of {} before returning the book",
                    fine.amount
                ),
                fine,
            }),
        )
            .into_response(),
    })
}
