//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::stats::CirculationStats, AppState};

use super::AuthenticatedUser;

/// Circulation statistics (admin)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Circulation statistics", body = CirculationStats),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> AppResult<Json<CirculationStats>> {
    ctx.require_admin()?;
    let today = state.services.circulation.today();
    let stats = state.services.stats.circulation_stats(today).await?;
    Ok(Json(stats))
}
