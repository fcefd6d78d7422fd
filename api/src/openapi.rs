use groupware_core::ErrorEnvelope;
use utoipa::OpenApi;
use utoipa::openapi::path::Operation;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::{ContentBuilder, Ref, RefOr, ResponseBuilder};

use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Groupware API",
        description = "HTTP API starter with localized success and error envelopes."
    ),
    paths(routes::health::health_check),
    components(schemas(ErrorEnvelope, routes::health::HealthResponse)),
    modifiers(&SecurityAddon, &StandardErrorResponses),
    tags((name = "system", description = "Service status"))
)]
pub struct ApiDoc;

/// Failure statuses any operation may answer with, all using `ErrorEnvelope`.
const STANDARD_ERRORS: &[(&str, &str)] = &[
    ("400", "Malformed request"),
    ("401", "Authentication required"),
    ("403", "Not allowed"),
    ("404", "Resource not found"),
    ("409", "Conflicts with the current state"),
    ("415", "Unsupported media type"),
    ("422", "Validation failed"),
    ("429", "Too many requests"),
    ("500", "Internal server error"),
];

/// JWT bearer scheme for routes that require a signed-in user.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

struct StandardErrorResponses;

impl utoipa::Modify for StandardErrorResponses {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for item in openapi.paths.paths.values_mut() {
            let operations = [
                item.get.as_mut(),
                item.put.as_mut(),
                item.post.as_mut(),
                item.delete.as_mut(),
                item.patch.as_mut(),
            ];
            for operation in operations.into_iter().flatten() {
                add_error_responses(operation);
            }
        }
    }
}

fn add_error_responses(operation: &mut Operation) {
    for (status, description) in STANDARD_ERRORS {
        operation
            .responses
            .responses
            .entry((*status).to_string())
            .or_insert_with(|| {
                RefOr::T(
                    ResponseBuilder::new()
                        .description(*description)
                        .content(
                            "application/json",
                            ContentBuilder::new()
                                .schema(Some(Ref::from_schema_name("ErrorEnvelope")))
                                .build(),
                        )
                        .build(),
                )
            });
    }
}

/// OpenAPI document reporting `version`.
pub fn document(version: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.version = version.to_string();
    doc
}
