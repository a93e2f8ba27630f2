pub mod analytics;
pub mod auth;
pub mod clock;
pub mod codec;
pub mod db;
pub mod demo;
pub mod domain;
pub mod error;
pub mod ids;
pub mod kv;
pub mod lifecycle;
pub mod metrics;
pub mod repo;
pub mod validate;
pub mod workspace;

#[cfg(test)]
mod tests {
    use super::error::{AppError, NOT_FOUND};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("DB_TEST", "db failed").with_retryable(false);
        assert_eq!(err.code, "DB_TEST");
        assert_eq!(err.message, "db failed");
        assert!(!err.retryable);
    }

    #[test]
    fn not_found_carries_the_id() {
        let err = AppError::not_found("abc123");
        assert!(err.is(NOT_FOUND));
        assert_eq!(err.details.as_deref(), Some("id=abc123"));
        assert_eq!(err.to_string(), "[NOT_FOUND] Report not found");
    }
}
