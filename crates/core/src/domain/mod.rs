// Domain Layer - Admission entities and token format

pub mod config;
pub mod error;
pub mod result;
pub mod state;
pub mod token;

// Re-exports
pub use config::{CancelEventConfig, QueueEventConfig};
pub use error::DomainError;
pub use result::{ActionType, Decision, RedirectKind, RedirectTarget, RequestValidationResult};
pub use state::SessionState;
pub use token::{QueueUrlParams, TokenRejection, TokenSyntax, UnsignedToken};
