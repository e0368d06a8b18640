//! Persistence gateway contract and the rows it accepts

use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store is closed")]
    Closed,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One document row
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub title: String,
    /// Effective date, `YYYY-MM-DD`
    pub date: String,
    /// Publication date exactly as delivered (empty if absent)
    pub pub_date: String,
    /// Ingestion timestamp, `YYYY-MM-DD HH:MM`
    pub time_get: String,
    pub response_url: String,
    pub url_key: String,
    pub domain_name: String,
    pub is_financial: bool,
    pub pump_dump_index: f64,
    /// Identity derived from the corpus and document GUIDs
    pub guid: Uuid,
}

/// A located occurrence of a sentiment object or sentiment word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRow {
    pub date: String,
    pub start: usize,
    pub end: usize,
    /// 1-based, monotonic across the document
    pub sentence_num: u32,
    /// 1-based
    pub block_num: u32,
    pub document_id: i64,
    pub instance_uri: String,
}

/// Per-block polarity counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSentiment {
    pub document_id: i64,
    pub block_num: u32,
    pub positive: u32,
    pub negative: u32,
    pub tokens: u32,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub documents: u64,
    pub occurrences: u64,
    pub terms: u64,
    pub sentiment_word_occurrences: u64,
    pub block_sentiments: u64,
}

/// Trait for fact storage backends
///
/// Writes are synchronous round-trips. Surrogate keys returned by
/// `write_document` and `write_occurrence` link child rows to their parent.
pub trait FactStore {
    /// Persist a document row, returning its surrogate key
    fn write_document(&self, row: &DocumentRow) -> StorageResult<i64>;

    /// Persist a sentiment-object occurrence, returning its surrogate key
    fn write_occurrence(&self, row: &OccurrenceRow) -> StorageResult<i64>;

    /// Attach the covered text to an occurrence
    fn write_term(&self, occurrence_id: i64, term: &str) -> StorageResult<()>;

    /// Persist a sentiment-word occurrence
    fn write_sentiment_word_occurrence(&self, row: &OccurrenceRow) -> StorageResult<()>;

    /// Persist a block aggregate
    fn write_block_sentiment(&self, row: &BlockSentiment) -> StorageResult<()>;

    /// Release the underlying connection. Never fails; repeated calls are no-ops.
    fn close(&self);
}

/// Extension trait for opening stores from paths
pub trait OpenStore: FactStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
