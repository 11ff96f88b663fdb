use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
    routing::get,
};
use common_errors::AppError;
use database_traits::GenericDao;
use tracing::instrument;
use user_models::{User, UserPayload};
use user_store::UserStore;

#[derive(Clone)]
pub struct UserServices {
    pub users: Arc<dyn UserStore>,
}

impl UserServices {
    pub fn new(users: Arc<dyn UserStore>) -> Self { Self { users } }
}

/// Routes for the users resource, ready to be merged into the app router.
pub fn router(services: UserServices) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(services)
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "List of users", body = Vec<User>),
        (status = 503, description = "User store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn list_users(
    State(services): State<UserServices>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = services.users.all().await?;

    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Invalid user ID", body = common_errors::ApiErrorResponse),
        (status = 404, description = "User not found", body = common_errors::ApiErrorResponse),
        (status = 503, description = "User store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn get_user(
    State(services): State<UserServices>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let user = services.users.find_by_id(id).await?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 400, description = "Malformed request body", body = common_errors::ApiErrorResponse),
        (status = 422, description = "Validation error", body = common_errors::ApiErrorResponse),
        (status = 503, description = "User store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn create_user(
    State(services): State<UserServices>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(payload) = payload?;
    let user = services.users.create(payload).await?;

    tracing::info!("User created: {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UserPayload,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = User),
        (status = 400, description = "Invalid request data", body = common_errors::ApiErrorResponse),
        (status = 404, description = "User not found", body = common_errors::ApiErrorResponse),
        (status = 422, description = "Validation error", body = common_errors::ApiErrorResponse),
        (status = 503, description = "User store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn update_user(
    State(services): State<UserServices>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let user = services.users.update(id, payload).await?;

    tracing::info!("User updated: {}", id);

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 400, description = "Invalid user ID", body = common_errors::ApiErrorResponse),
        (status = 404, description = "User not found", body = common_errors::ApiErrorResponse),
        (status = 503, description = "User store unavailable", body = common_errors::ApiErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn delete_user(
    State(services): State<UserServices>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    services.users.delete(id).await?;

    tracing::info!("User deleted: {}", id);

    Ok(StatusCode::NO_CONTENT)
}
