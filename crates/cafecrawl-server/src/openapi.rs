use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "cafecrawl API",
        version = "0.2.0",
        description = "Café POI crawler over Kakao Local category search."
    ),
    paths(
        crate::routes::start_crawl,
        crate::routes::list_crawls,
        crate::routes::list_cafes,
        crate::routes::get_cafe,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::CrawlSummaryResponse,
        crate::dto::CrawlRunResponse,
        crate::dto::CrawlRunListResponse,
        crate::dto::CafeResponse,
        crate::dto::CafeListResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "crawls", description = "Crawl runs"),
        (name = "cafes", description = "Stored cafés"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "Admin token. Set via CAFECRAWL_ADMIN_TOKEN environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
