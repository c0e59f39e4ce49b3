//! Axum router construction.
//!
//! Builds the application router with the product routes, middleware
//! layers, OpenAPI docs, and static serving of the upload directory.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::routes;
use crate::uploads;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::products::list_products,
        routes::products::get_product,
        routes::products::create_product,
        routes::products::update_product,
        routes::products::delete_product,
    ),
    components(schemas(
        routes::products::ProductResponse,
        routes::products::CreateProductResponse,
        routes::products::MessageResponse,
    ))
)]
struct ApiDoc;

/// Generous multipart ceiling: five files at the per-file limit plus form
/// text. Per-file enforcement happens in the upload store.
fn upload_body_limit(ctx: &AppContext) -> DefaultBodyLimit {
    let per_file = ctx.config.storage.max_file_size_bytes;
    let files = ctx.config.storage.max_files_per_request as u64;
    DefaultBodyLimit::max((per_file * files + 1024 * 1024) as usize)
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let product_routes = Router::new()
        .route(
            "/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/products/{id}",
            get(routes::products::get_product)
                .patch(routes::products::update_product)
                .delete(routes::products::delete_product),
        )
        .layer(upload_body_limit(&ctx));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", product_routes)
        .nest_service(
            uploads::PUBLIC_PREFIX,
            ServeDir::new(ctx.uploads.root()),
        )
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
