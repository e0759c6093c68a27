//! Promocat Domain Concerns

pub mod active_days;
pub mod coordinator;
mod errors;
pub mod memberships;
pub mod promotions;

pub use errors::ServiceError;
