//! Unified service-layer error type for checkout-server
//!
//! `ServiceError` bridges the gap between infrastructure errors
//! (`sqlx::Error`, `redis::RedisError`) and the API-layer error (`AppError`).
//! It enables `?` propagation without manual
//! `.map_err(|e| { tracing::error!(...); AppError::new(...) })` boilerplate.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

/// Service-layer error — only three variants, keeps things simple.
///
/// - `Db`: Postgres errors (auto-logged, mapped to DatabaseError)
/// - `Cache`: Redis errors (auto-logged, mapped to CacheError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database error (sqlx)
    Db(sqlx::Error),
    /// Key/value store error (redis)
    Cache(redis::RedisError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl ServiceError {
    /// True when the store reported a deadlock / serialization conflict the
    /// caller may retry (Postgres 40001 / 40P01, MySQL 1213)
    pub fn is_deadlock(&self) -> bool {
        match self {
            ServiceError::Db(e) => is_deadlock(e),
            _ => false,
        }
    }
}

/// Store-reported deadlock or serialization failure
pub fn is_deadlock(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| is_retryable_code(code.as_ref())),
        _ => false,
    }
}

/// Vendor codes that indicate a retryable lock conflict
pub(crate) fn is_retryable_code(code: &str) -> bool {
    matches!(code, "40001" | "40P01" | "1213")
}

/// Unique-constraint violation (Postgres 23505)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e)
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(e: redis::RedisError) -> Self {
        ServiceError::Cache(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
            ServiceError::Cache(cache_err) => {
                tracing::error!(error = %cache_err, "Service cache error");
                AppError::new(ErrorCode::CacheError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Db(e) => write!(f, "database error: {e}"),
            ServiceError::Cache(e) => write!(f, "cache error: {e}"),
            ServiceError::App(e) => write!(f, "{e}"),
        }
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_codes() {
        assert!(is_retryable_code("40001"));
        assert!(is_retryable_code("40P01"));
        assert!(is_retryable_code("1213"));
        assert!(!is_retryable_code("23505"));
        assert!(!is_retryable_code("42601"));
    }

    #[test]
    fn test_app_error_passes_through() {
        let err = ServiceError::App(AppError::new(ErrorCode::InsufficientStock));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn test_non_db_error_is_not_deadlock() {
        let err = ServiceError::App(AppError::new(ErrorCode::HighContention));
        assert!(!err.is_deadlock());

        let err = ServiceError::Db(sqlx::Error::RowNotFound);
        assert!(!err.is_deadlock());
    }
}
