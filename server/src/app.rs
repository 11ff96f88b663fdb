use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use redis_connection::CacheService;
use serde::Serialize;
use sql_connection::{PoolStatus, SqlConnect};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use user_http::UserServices;
use user_store::UserStore;
use utoipa::{OpenApi, ToSchema};
use utoipa_rapidoc::RapiDoc;

#[derive(Clone)]
pub struct HealthState {
    pub db: Option<SqlConnect>,
    pub cache: Arc<dyn CacheService>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[schema(value_type = Option<Object>)]
    pub database: Option<PoolStatus>,
    pub cache: String,
}

/// Assembles the full HTTP application: user routes, health, OpenAPI.
pub fn build_app(users: Arc<dyn UserStore>, health: HealthState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(health);

    Router::new()
        .merge(user_http::router(UserServices::new(users)))
        .merge(health_routes)
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/docs"))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        user_http::list_users,
        user_http::get_user,
        user_http::create_user,
        user_http::update_user,
        user_http::delete_user
    ),
    components(
        schemas(
            HealthResponse,
            user_models::User,
            user_models::UserPayload,
            common_errors::ApiErrorResponse,
            common_errors::ApiErrorInfo,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User management endpoints")
    ),
    info(
        title = "User Cache API",
        description = "Cache-aside access to user records",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up, with connection pool status", body = HealthResponse)
    ),
    tag = "health"
)]
async fn health_check(State(health): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        database: health.db.as_ref().map(SqlConnect::pool_status),
        cache: health.cache.backend_name().to_string(),
    })
}
