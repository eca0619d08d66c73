//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, circulation, copies, fines, health, librarians, members, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.3.0",
        description = "Library circulation REST API: borrows, returns, fines and payments",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        // Circulation
        circulation::borrow,
        circulation::return_copy,
        // Fines
        fines::list_unpaid_fines,
        fines::pay_fine,
        fines::assess_overdue_fines,
        // Copies
        copies::copy_status,
        copies::remove_copy,
        copies::add_copies,
        copies::add_book,
        copies::search_books,
        // Members
        members::add_member,
        members::get_member,
        // Librarians
        librarians::list_librarians,
        librarians::create_librarian,
        librarians::update_librarian,
        librarians::delete_librarian,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::Role,
            crate::models::BorrowRequest,
            crate::models::BorrowRecord,
            crate::models::BorrowTransaction,
            crate::models::ReturnRequest,
            crate::models::ReturnRecord,
            crate::models::borrow::OpenBorrowInfo,
            circulation::BorrowResponse,
            circulation::ReturnResponse,
            circulation::PaymentRequiredResponse,
            crate::models::Fine,
            crate::models::FineDetails,
            crate::models::Payment,
            crate::models::fine::PayFine,
            crate::models::fine::AssessmentReport,
            fines::UnpaidFinesResponse,
            fines::PaymentResponse,
            crate::models::CopyStatus,
            crate::models::CopyInfo,
            crate::models::copy::CopyStatusReport,
            crate::models::copy::AddCopies,
            crate::models::copy::AddedCopies,
            crate::models::copy::RemovedCopy,
            crate::models::book::AddBook,
            crate::models::book::AddedBook,
            crate::models::book::BookSearchResult,
            crate::models::book::BookSearchResponse,
            crate::models::Member,
            crate::models::member::CreateMember,
            crate::models::Librarian,
            crate::models::user::CreateLibrarian,
            crate::models::user::UpdateLibrarian,
            crate::services::stats::CirculationStats,
            crate::repository::stats::TitleCirculation,
            crate::repository::stats::MemberFines,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "circulation", description = "Borrow and return"),
        (name = "fines", description = "Fines and payments"),
        (name = "copies", description = "Books and copies"),
        (name = "members", description = "Library members"),
        (name = "librarians", description = "Librarian accounts (admin only)"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
