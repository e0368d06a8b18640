//! Occurrence extraction
//!
//! Turns one indexed document into sentiment-object occurrences,
//! sentiment-word occurrences and per-block polarity aggregates.

mod extractor;
mod facts;

pub use extractor::{
    block_selector, extract, ExtractionContext, ExtractionSummary, SentenceTally, Tally,
    CONTENT_BLOCKS, SENTENCE, SENTIMENT_OBJECT, SENTIMENT_WORD, TOKEN, UNSEEN_CONTENT_BLOCKS,
};
pub use facts::{Fact, FactSink, Polarity};
