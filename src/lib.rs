//! corpus-facts: sentiment occurrence extraction for annotated corpora
//!
//! Consumes corpora produced by an annotation pipeline and persists the
//! facts derived from each document: the document row, sentiment-object and
//! sentiment-word occurrences, and per-block polarity aggregates.
//!
//! # Core Concepts
//!
//! - **Identity**: a document's id is the MD5 of its corpus and document GUIDs
//! - **Date**: the publication date replaces the ingestion date when it is
//!   recent and precedes ingestion
//! - **Extraction**: one ordered pass over blocks, sentences and spans
//!
//! # Example
//!
//! ```
//! use corpus_facts::{BatchConsumer, Corpus, OpenStore, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::open_in_memory().unwrap());
//! let consumer = BatchConsumer::new(store);
//! let report = consumer.consume(&Corpus::new("empty", "0f8fad5b-d9cb-469f-a165-70867728950e"));
//! assert!(report.is_clean());
//! ```

pub mod consumer;
pub mod corpus;
pub mod date;
pub mod extract;
pub mod identity;
pub mod storage;

pub use consumer::{
    BatchConsumer, BatchReport, ConsumerOptions, DocumentError, DocumentFailure, DocumentHeader,
    DocumentOutcome,
};
pub use corpus::{Annotation, AnnotationIndex, Corpus, CorpusError, Document};
pub use date::reconcile_date;
pub use extract::{extract, ExtractionSummary, Fact, FactSink, Polarity};
pub use identity::derive_document_id;
pub use storage::{FactStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
