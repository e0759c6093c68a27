//! Active Days

pub mod records;
pub mod service;

pub use service::{ActiveDaysService, StoreActiveDaysService};
