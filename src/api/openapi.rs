//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, loans, materials, references, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio API",
        version = "1.0.0",
        description = "Library lending REST API",
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
        auth::register,
        auth::me,
        // Users
        users::create_user,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Materials
        materials::get_material,
        materials::create_material,
        materials::update_material,
        materials::delete_material,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::get_loan,
        loans::list_loans,
        loans::get_user_loans,
        // Reference data
        references::delete_role,
        references::delete_author,
        references::delete_material_type,
        references::delete_loan_status,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::AuthResponse,
            crate::auth::Identity,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Materials
            crate::models::material::Material,
            crate::models::material::CreateMaterial,
            crate::models::material::UpdateMaterial,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanState,
            crate::models::loan::CreateLoan,
            // Reference data
            crate::models::reference::DeleteResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "materials", description = "Material catalog"),
        (name = "loans", description = "Loan management"),
        (name = "references", description = "Reference data deletion")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by protected paths
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
