//! Store-backed promotion views and the services that keep them consistent.

pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;
