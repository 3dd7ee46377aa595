pub mod auth_token;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::relations::RelationError;
use crate::validation::ValidationErrors;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Render a relation-manager error at the HTTP boundary: missing targets and
/// missing rows are 404, duplicates are 409, self-follow is 400. Database
/// errors are logged here and surface as 500.
pub fn relation_error_response(error: RelationError) -> Response {
    let (status, message) = match error {
        RelationError::TargetNotFound(_)
        | RelationError::NotFound(_) => (StatusCode::NOT_FOUND, error.to_string()),
        RelationError::AlreadyExists(_) => (StatusCode::CONFLICT, error.to_string()),
        RelationError::SelfReference => (StatusCode::BAD_REQUEST, error.to_string()),
        RelationError::Db(e) => {
            tracing::error!("Relation operation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        }
    };
    (status, Json(ErrorResponse { error: message })).into_response()
}

/// Render a field-keyed validation report as a 400 with a
/// `{ "field": ["message", ...] }` body.
pub fn validation_error_response(errors: ValidationErrors) -> Response {
    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(components(schemas(ErrorResponse, crate::pagination::PaginationMetadata)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // Add security scheme
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        auth_token::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        // Merge paths
        spec.paths.paths.extend(module_spec.paths.paths);

        // Merge components (schemas)
        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
