//! Route configuration and setup

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use tablero_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::AuthState;
use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        jwt_secret: config.jwt_secret.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            &format!("{API_PREFIX}/auth/login"),
            post(handlers::auth_login::login),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        );

    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .nest(API_PREFIX, protected_routes())
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            crate::auth::middleware::auth_middleware,
        ));

    // Multipart uploads carry the whole file plus form overhead.
    let body_limit = state.media.max_file_size + 64 * 1024;

    let app = public_routes
        .merge(protected_routes)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Companies
        .route(
            "/companies",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/companies/{id}",
            get(handlers::companies::get_company).put(handlers::companies::update_company),
        )
        // Members
        .route(
            "/companies/{id}/members",
            post(handlers::members::create_member).get(handlers::members::list_members),
        )
        .route(
            "/companies/{id}/members/{user_id}/role",
            put(handlers::members::change_member_role),
        )
        // Users
        .route(
            "/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route("/users/invite", post(handlers::users::invite_user))
        // Attribute definitions
        .route(
            "/companies/{id}/attribute-definitions",
            post(handlers::attribute_definitions::create_definitions)
                .get(handlers::attribute_definitions::list_definitions),
        )
        .route(
            "/companies/{id}/attribute-definitions/import",
            post(handlers::attribute_definitions::import_definitions),
        )
        .route(
            "/companies/{id}/attribute-definitions/template",
            get(handlers::attribute_definitions::definition_template),
        )
        .route(
            "/attribute-definitions/{id}",
            put(handlers::attribute_definitions::update_definition),
        )
        // Items
        .route(
            "/companies/{id}/items",
            post(handlers::items::create_item).get(handlers::items::list_items),
        )
        .route(
            "/items/{id}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        // Attribute values
        .route(
            "/items/{id}/attributes",
            get(handlers::attribute_values::list_item_attributes),
        )
        .route(
            "/items/{id}/attributes/{attribute_id}",
            put(handlers::attribute_values::upsert_value),
        )
        // Media
        .route(
            "/items/{id}/media",
            post(handlers::media_upload::upload_media).get(handlers::media_upload::list_item_media),
        )
        .route("/media/{id}", delete(handlers::media_delete::delete_media))
        // Blog
        .route(
            "/companies/{id}/blog",
            post(handlers::blog::create_post).get(handlers::blog::list_posts),
        )
        .route(
            "/blog/{id}",
            put(handlers::blog::update_post).delete(handlers::blog::delete_post),
        )
        // Filter preferences
        .route(
            "/filter-preferences",
            get(handlers::preferences::get_preference).put(handlers::preferences::save_preference),
        )
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any)
    };
    Ok(cors)
}
