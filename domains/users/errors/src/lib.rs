use common_errors::AppError;
use sql_connection::{PgError, PoolError as DbPoolError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("User not found: {user_id}")]
    NotFound { user_id: i64 },
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

impl UserError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// SQLSTATE classes 22 (data exception) and 23 (integrity constraint
/// violation) are caused by the request; anything else means the store
/// could not serve it.
impl From<PgError> for UserError {
    fn from(err: PgError) -> Self {
        match err.code().map(|state| state.code()) {
            Some(code) if code.starts_with("22") || code.starts_with("23") => {
                let msg = err
                    .as_db_error()
                    .map(|db| db.message().to_string())
                    .unwrap_or_else(|| err.to_string());
                Self::ValidationFailed(msg)
            }
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<DbPoolError> for UserError {
    fn from(err: DbPoolError) -> Self {
        Self::Unavailable(format!("Database connection error: {err}"))
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound { user_id } => {
                AppError::not_found(
                    "USER_NOT_FOUND",
                    &format!("User with ID {user_id} not found"),
                )
            }
            UserError::ValidationFailed(msg) => {
                AppError::unprocessable_entity_with_details(
                    "VALIDATION_FAILED",
                    "User data failed validation",
                    &msg,
                )
            }
            UserError::Unavailable(_) => {
                AppError::service_unavailable(
                    "SOURCE_UNAVAILABLE",
                    "User store is temporarily unavailable",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: AppError = UserError::NotFound { user_id: 99 }.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "USER_NOT_FOUND");
        assert_eq!(err.to_string(), "User with ID 99 not found");
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err: AppError = UserError::validation("email is required").into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_unavailable_maps_to_503_without_leaking_cause() {
        let err: AppError =
            UserError::unavailable("connection refused 10.0.0.5").into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
        assert!(!err.to_string().contains("10.0.0.5"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(UserError::NotFound { user_id: 1 }.is_not_found());
        assert!(!UserError::unavailable("x").is_not_found());
    }
}
