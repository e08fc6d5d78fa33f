//! room-watch domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Listings, notifications and inbound updates
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `seen`: The persisted set of already-notified listing identifiers
//! - `usecases`: Validation, rendering, the poll loop and the echo responder

pub mod model;
pub mod ports;
pub mod seen;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use seen::SeenSet;
