// Application Layer - Use Cases and Business Logic

pub mod admission;

// Re-exports
pub use admission::AdmissionService;
