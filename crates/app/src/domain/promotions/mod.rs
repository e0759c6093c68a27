//! Promotions

pub mod records;
pub mod service;

pub use service::{PromotionsService, StorePromotionsService};
