//! Storage backends for extracted facts
//!
//! The core writes through the `FactStore` trait. `SqliteStore` is the
//! bundled relational implementation.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    BlockSentiment, DocumentRow, FactStore, OccurrenceRow, OpenStore, StorageError,
    StorageResult, StoreStats,
};
