//! room-watch adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `listing_api`: HTTP adapter for the upstream listing API
//! - `telegram`: Telegram Bot API messenger and update feed
//! - `state`: Flat-file, SQLite and in-memory seen-set stores
//! - `outbox`: JSONL messenger used for dry runs

mod state_file;
mod state_memory;
mod state_sqlite;

pub mod listing_api;
pub mod outbox;
pub mod telegram;

/// Re-exports for seen-set stores
pub mod state {
    pub use crate::state_file::FileSeenStore;
    pub use crate::state_memory::InMemorySeenStore;
    pub use crate::state_sqlite::SqliteSeenStore;
}
