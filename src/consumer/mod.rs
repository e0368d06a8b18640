//! Batch consumer: runs every document of a corpus through extraction
//!
//! Documents are independent. For each one the consumer validates the
//! header, builds the annotation index, writes the document row and then
//! streams every extracted fact to the store as it is produced. A failing
//! document is logged and skipped; writes it already issued are not rolled
//! back.

mod error;
mod header;

pub use error::DocumentError;
pub use header::{parse_is_financial, DocumentHeader};

use crate::corpus::{AnnotationIndex, Corpus, Document};
use crate::extract::{extract, ExtractionContext, ExtractionSummary, Fact, FactSink};
use crate::storage::{FactStore, StorageError};
use std::sync::Arc;

/// Runtime policy for a batch
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumerOptions {
    /// Stop at the first failing document instead of continuing
    pub fail_fast: bool,
}

/// A document that was fully processed
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// Surrogate key of the document row
    pub document_id: i64,
    pub header: DocumentHeader,
    pub summary: ExtractionSummary,
}

/// A document that failed
#[derive(Debug)]
pub struct DocumentFailure {
    pub position: usize,
    /// The document's own `guid` feature, as delivered
    pub guid: Option<String>,
    pub error: DocumentError,
}

/// Outcome of one corpus
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<DocumentOutcome>,
    pub failed: Vec<DocumentFailure>,
    /// True if `fail_fast` stopped the batch early
    pub aborted: bool,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives extraction over corpora, writing through one store
pub struct BatchConsumer {
    store: Arc<dyn FactStore>,
    options: ConsumerOptions,
}

impl BatchConsumer {
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self {
            store,
            options: ConsumerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConsumerOptions) -> Self {
        self.options = options;
        self
    }

    /// Process every document of `corpus`, one at a time
    pub fn consume(&self, corpus: &Corpus) -> BatchReport {
        let mut report = BatchReport::default();
        for (position, document) in corpus.documents.iter().enumerate() {
            match self.process_document(corpus.guid(), document) {
                Ok(outcome) => {
                    let summary = &outcome.summary;
                    tracing::debug!(
                        position,
                        document_id = outcome.document_id,
                        identity = %outcome.header.identity,
                        blocks = summary.blocks,
                        sentences = summary.sentences,
                        tokens = summary.tokens,
                        positive = summary.polarity.positive,
                        negative = summary.polarity.negative,
                        "document processed"
                    );
                    report.processed.push(outcome);
                }
                Err(error) => {
                    let guid = document.feature("guid").map(str::to_string);
                    tracing::warn!(
                        position,
                        guid = guid.as_deref().unwrap_or("<missing>"),
                        error = %error,
                        "document failed"
                    );
                    report.failed.push(DocumentFailure { position, guid, error });
                    if self.options.fail_fast {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        tracing::info!(
            corpus = %corpus.name,
            documents = corpus.documents.len(),
            processed = report.processed.len(),
            failed = report.failed.len(),
            "corpus consumed"
        );
        report
    }

    /// Process one document: header, index, document row, then streamed facts
    pub fn process_document(
        &self,
        corpus_guid: Option<&str>,
        document: &Document,
    ) -> Result<DocumentOutcome, DocumentError> {
        let header = DocumentHeader::parse(corpus_guid, document)?;
        let index = AnnotationIndex::build(document)?;

        let document_id = self.store.write_document(&header.to_row())?;
        let context = ExtractionContext {
            document_id,
            date: header.date_string(),
        };
        let mut sink = StoreSink {
            store: self.store.as_ref(),
        };
        let summary = extract(&index, header.block_selector(), &context, &mut sink)?;
        Ok(DocumentOutcome {
            document_id,
            header,
            summary,
        })
    }

    /// Release the store. Teardown failures are swallowed.
    pub fn close(&self) {
        self.store.close();
    }
}

/// Forwards each fact to the store the moment it is produced
struct StoreSink<'s> {
    store: &'s dyn FactStore,
}

impl FactSink for StoreSink<'_> {
    type Error = StorageError;

    fn accept(&mut self, fact: Fact) -> Result<(), Self::Error> {
        match fact {
            Fact::SentimentObject { occurrence, term } => {
                let occurrence_id = self.store.write_occurrence(&occurrence)?;
                self.store.write_term(occurrence_id, &term)
            }
            Fact::SentimentWord { occurrence, .. } => {
                self.store.write_sentiment_word_occurrence(&occurrence)
            }
            Fact::BlockSentiment(block) => self.store.write_block_sentiment(&block),
        }
    }
}
