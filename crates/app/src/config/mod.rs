//! Configuration
//!
//! Settings are read from CLI flags or the environment; a `.env` file is loaded
//! first when present.

pub mod observability;
pub mod store;

pub use observability::{LogFormat, LoggingConfig};
pub use store::StoreConfig;
