// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Token rejections never show up here: they are decisions, carried inside
/// `RequestValidationResult`. Only bad configs and collaborator failures
/// propagate.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("State repository error: {0}")]
    Repository(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
