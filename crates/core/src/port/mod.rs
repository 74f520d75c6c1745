// Port Layer - Interfaces for external dependencies

pub mod state_repository;
pub mod time_provider;

// Re-exports
pub use state_repository::StateRepository;
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
