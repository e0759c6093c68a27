//! Promocat
//!
//! Domain types for a promotional-discount catalog: caller-assigned identifiers,
//! inclusive calendar-date ranges, promotion records with their typed inputs and
//! defaults, membership discount terms, and YAML catalog fixtures.
//!
//! This crate performs no I/O against the store; persistence and view maintenance
//! live in `promocat-app`.

pub mod dates;
pub mod errors;
pub mod fixtures;
pub mod ids;
pub mod memberships;
pub mod prelude;
pub mod promotions;
