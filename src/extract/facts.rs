//! Records emitted by the extractor and the sink that receives them

use crate::storage::{BlockSentiment, OccurrenceRow};
use std::convert::Infallible;

/// Polarity of a sentiment word, read from the suffix of its class URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    /// Matches neither suffix. Still persisted as an occurrence, counted nowhere.
    Unclassified,
}

impl Polarity {
    pub fn classify(class_uri: &str) -> Self {
        if class_uri.ends_with("PositiveWord") {
            Self::Positive
        } else if class_uri.ends_with("NegativeWord") {
            Self::Negative
        } else {
            Self::Unclassified
        }
    }
}

/// One derived fact, in traversal order
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// A sentiment object and the text it covers
    SentimentObject { occurrence: OccurrenceRow, term: String },
    /// A sentiment word of any polarity
    SentimentWord { occurrence: OccurrenceRow, polarity: Polarity },
    /// Counts for a block holding at least one classified sentiment word
    BlockSentiment(BlockSentiment),
}

/// Receives facts as the extractor produces them.
///
/// Facts are streamed, not buffered: a sink error stops the traversal and
/// the remaining facts of the document are never produced.
pub trait FactSink {
    type Error;

    fn accept(&mut self, fact: Fact) -> Result<(), Self::Error>;
}

impl FactSink for Vec<Fact> {
    type Error = Infallible;

    fn accept(&mut self, fact: Fact) -> Result<(), Self::Error> {
        self.push(fact);
        Ok(())
    }
}
