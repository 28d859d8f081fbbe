//! Domain layer - Pure business abstractions
//!
//! This layer contains NO web framework dependencies.
//! Only trait definitions, pagination parameters and domain error types.

pub mod errors;
pub mod pagination;
pub mod repositories;

pub use errors::{DomainError, is_unique_violation};
pub use pagination::{PageRequest, Paginated};
pub use repositories::*;
