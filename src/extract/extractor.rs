//! Block → sentence → span traversal
//!
//! A single depth-first pass over one indexed document. Blocks and sentences
//! are numbered from 1; sentence numbers keep counting across blocks.
//! Polarity counters live at three levels: the sentence and block tallies
//! reset on entry, the document tally spans the whole pass.

use super::facts::{Fact, FactSink, Polarity};
use crate::corpus::{Annotation, AnnotationIndex};
use crate::storage::{BlockSentiment, OccurrenceRow};

/// Authoritative block layer for revision `1` documents
pub const CONTENT_BLOCKS: &str = "TextBlock/Content";
/// Authoritative block layer for every other revision
pub const UNSEEN_CONTENT_BLOCKS: &str = "TextBlock/Content/Unseen";
pub const SENTENCE: &str = "Sentence";
pub const TOKEN: &str = "Token";
pub const SENTIMENT_OBJECT: &str = "SentimentObject";
pub const SENTIMENT_WORD: &str = "SentimentWord";

/// Block selector for a document's `rev` feature
pub fn block_selector(rev: Option<&str>) -> &'static str {
    if rev == Some("1") {
        CONTENT_BLOCKS
    } else {
        UNSEEN_CONTENT_BLOCKS
    }
}

/// Values shared by every record of one document
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    /// Surrogate key of the persisted document row
    pub document_id: i64,
    /// Effective date, `YYYY-MM-DD`
    pub date: String,
}

/// Positive/negative counts at one nesting level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub positive: u32,
    pub negative: u32,
}

impl Tally {
    fn record(&mut self, polarity: Polarity) {
        match polarity {
            Polarity::Positive => self.positive += 1,
            Polarity::Negative => self.negative += 1,
            Polarity::Unclassified => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positive == 0 && self.negative == 0
    }
}

/// Counts for one sentence. Logged, not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentenceTally {
    pub sentence_num: u32,
    pub tokens: usize,
    pub polarity: Tally,
}

/// What one document's traversal produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Sum of per-block token counts
    pub tokens: usize,
    pub blocks: u32,
    pub sentences: u32,
    /// Document-level polarity totals
    pub polarity: Tally,
    pub sentiment_objects: usize,
    pub sentiment_words: usize,
    pub block_aggregates: usize,
}

/// Walk every block of `block_selector`, streaming facts into `sink`.
///
/// Stops at the first sink error; facts already accepted stay accepted.
pub fn extract<S: FactSink>(
    index: &AnnotationIndex<'_>,
    block_selector: &str,
    context: &ExtractionContext,
    sink: &mut S,
) -> Result<ExtractionSummary, S::Error> {
    let mut walk = DocumentWalk {
        index,
        context,
        block_num: 0,
        sentence_num: 0,
        document: Tally::default(),
        summary: ExtractionSummary::default(),
    };
    for block in index.all(block_selector) {
        walk.visit_block(block, sink)?;
    }
    walk.summary.polarity = walk.document;
    Ok(walk.summary)
}

struct DocumentWalk<'a, 'd> {
    index: &'a AnnotationIndex<'d>,
    context: &'a ExtractionContext,
    block_num: u32,
    sentence_num: u32,
    document: Tally,
    summary: ExtractionSummary,
}

impl DocumentWalk<'_, '_> {
    fn visit_block<S: FactSink>(&mut self, block: &Annotation, sink: &mut S) -> Result<(), S::Error> {
        self.block_num += 1;
        self.summary.blocks += 1;
        let tokens = self.index.count_within(TOKEN, block.start, block.end);
        self.summary.tokens += tokens;

        let mut tally = Tally::default();
        let index = self.index;
        for sentence in index.within(SENTENCE, block.start, block.end) {
            let sentence_tally = self.visit_sentence(sentence, &mut tally, sink)?;
            tracing::trace!(
                sentence = sentence_tally.sentence_num,
                tokens = sentence_tally.tokens,
                positive = sentence_tally.polarity.positive,
                negative = sentence_tally.polarity.negative,
                "sentence done"
            );
        }

        if !tally.is_empty() {
            sink.accept(Fact::BlockSentiment(BlockSentiment {
                document_id: self.context.document_id,
                block_num: self.block_num,
                positive: tally.positive,
                negative: tally.negative,
                tokens: u32::try_from(tokens).unwrap_or(u32::MAX),
            }))?;
            self.summary.block_aggregates += 1;
        }
        Ok(())
    }

    fn visit_sentence<S: FactSink>(
        &mut self,
        sentence: &Annotation,
        block: &mut Tally,
        sink: &mut S,
    ) -> Result<SentenceTally, S::Error> {
        self.sentence_num += 1;
        self.summary.sentences += 1;
        let mut tally = SentenceTally {
            sentence_num: self.sentence_num,
            tokens: self.index.count_within(TOKEN, sentence.start, sentence.end),
            polarity: Tally::default(),
        };

        let index = self.index;
        for object in index.within(SENTIMENT_OBJECT, sentence.start, sentence.end) {
            sink.accept(Fact::SentimentObject {
                occurrence: self.occurrence(object),
                term: index.covered_text(object).to_string(),
            })?;
            self.summary.sentiment_objects += 1;
        }

        for word in index.within(SENTIMENT_WORD, sentence.start, sentence.end) {
            let polarity = Polarity::classify(word.feature("instanceClassUri").unwrap_or_default());
            tally.polarity.record(polarity);
            block.record(polarity);
            self.document.record(polarity);
            sink.accept(Fact::SentimentWord {
                occurrence: self.occurrence(word),
                polarity,
            })?;
            self.summary.sentiment_words += 1;
        }

        Ok(tally)
    }

    fn occurrence(&self, span: &Annotation) -> OccurrenceRow {
        OccurrenceRow {
            date: self.context.date.clone(),
            start: span.start,
            end: span.end,
            sentence_num: self.sentence_num,
            block_num: self.block_num,
            document_id: self.context.document_id,
            instance_uri: span.feature("instanceUri").unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;

    const POSITIVE: &str = "http://example.com/sentiment#PositiveWord";
    const NEGATIVE: &str = "http://example.com/sentiment#NegativeWord";

    fn context() -> ExtractionContext {
        ExtractionContext {
            document_id: 7,
            date: "2024-01-08".to_string(),
        }
    }

    fn word(start: usize, end: usize, class_uri: &str) -> Annotation {
        Annotation::new(SENTIMENT_WORD, start, end)
            .with_feature("instanceUri", format!("http://example.com/words#{start}"))
            .with_feature("instanceClassUri", class_uri)
    }

    fn run(doc: &Document, selector: &str) -> (ExtractionSummary, Vec<Fact>) {
        let index = AnnotationIndex::build(doc).unwrap();
        let mut facts = Vec::new();
        let summary = extract(&index, selector, &context(), &mut facts).unwrap();
        (summary, facts)
    }

    /// "Apple shares gained. Losses loom." as one content block
    fn two_sentence_document() -> Document {
        Document::new("Apple shares gained. Losses loom.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 33))
            .with_annotation(Annotation::new(SENTENCE, 0, 20))
            .with_annotation(Annotation::new(SENTENCE, 21, 33))
            .with_annotation(Annotation::new(TOKEN, 0, 5))
            .with_annotation(Annotation::new(TOKEN, 6, 12))
            .with_annotation(Annotation::new(TOKEN, 13, 19))
            .with_annotation(Annotation::new(TOKEN, 21, 27))
            .with_annotation(Annotation::new(TOKEN, 28, 32))
            .with_annotation(
                Annotation::new(SENTIMENT_OBJECT, 0, 5)
                    .with_feature("instanceUri", "http://example.com/companies#Apple"),
            )
            .with_annotation(word(13, 19, POSITIVE))
            .with_annotation(word(21, 27, NEGATIVE))
    }

    #[test]
    fn selector_follows_revision() {
        assert_eq!(block_selector(Some("1")), CONTENT_BLOCKS);
        assert_eq!(block_selector(Some("2")), UNSEEN_CONTENT_BLOCKS);
        assert_eq!(block_selector(Some("")), UNSEEN_CONTENT_BLOCKS);
        assert_eq!(block_selector(None), UNSEEN_CONTENT_BLOCKS);
    }

    #[test]
    fn two_sentence_block_emits_expected_facts() {
        let (summary, facts) = run(&two_sentence_document(), CONTENT_BLOCKS);

        assert_eq!(facts.len(), 4);
        match &facts[0] {
            Fact::SentimentObject { occurrence, term } => {
                assert_eq!(term, "Apple");
                assert_eq!((occurrence.start, occurrence.end), (0, 5));
                assert_eq!(occurrence.sentence_num, 1);
                assert_eq!(occurrence.block_num, 1);
                assert_eq!(occurrence.document_id, 7);
                assert_eq!(occurrence.date, "2024-01-08");
                assert_eq!(occurrence.instance_uri, "http://example.com/companies#Apple");
            }
            other => panic!("expected sentiment object, got {:?}", other),
        }
        match &facts[1] {
            Fact::SentimentWord { occurrence, polarity } => {
                assert_eq!(*polarity, Polarity::Positive);
                assert_eq!(occurrence.sentence_num, 1);
            }
            other => panic!("expected sentiment word, got {:?}", other),
        }
        match &facts[2] {
            Fact::SentimentWord { occurrence, polarity } => {
                assert_eq!(*polarity, Polarity::Negative);
                assert_eq!(occurrence.sentence_num, 2);
                assert_eq!((occurrence.start, occurrence.end), (21, 27));
            }
            other => panic!("expected sentiment word, got {:?}", other),
        }
        assert_eq!(
            facts[3],
            Fact::BlockSentiment(BlockSentiment {
                document_id: 7,
                block_num: 1,
                positive: 1,
                negative: 1,
                tokens: 5,
            })
        );

        assert_eq!(summary.tokens, 5);
        assert_eq!(summary.sentences, 2);
        assert_eq!(summary.polarity, Tally { positive: 1, negative: 1 });
        assert_eq!(summary.sentiment_objects, 1);
        assert_eq!(summary.sentiment_words, 2);
        assert_eq!(summary.block_aggregates, 1);
    }

    #[test]
    fn block_without_sentiment_words_emits_no_aggregate() {
        let doc = Document::new("Quiet day.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 10))
            .with_annotation(Annotation::new(SENTENCE, 0, 10))
            .with_annotation(Annotation::new(TOKEN, 0, 5))
            .with_annotation(Annotation::new(TOKEN, 6, 9))
            .with_annotation(Annotation::new(SENTIMENT_OBJECT, 0, 5));

        let (summary, facts) = run(&doc, CONTENT_BLOCKS);

        assert!(facts.iter().all(|f| !matches!(f, Fact::BlockSentiment(_))));
        assert_eq!(summary.tokens, 2);
        assert_eq!(summary.block_aggregates, 0);
    }

    #[test]
    fn single_positive_word_aggregates_one_zero() {
        let doc = Document::new("Great.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 6))
            .with_annotation(Annotation::new(SENTENCE, 0, 6))
            .with_annotation(Annotation::new(TOKEN, 0, 5))
            .with_annotation(word(0, 5, POSITIVE));

        let (_, facts) = run(&doc, CONTENT_BLOCKS);

        assert_eq!(
            facts.last(),
            Some(&Fact::BlockSentiment(BlockSentiment {
                document_id: 7,
                block_num: 1,
                positive: 1,
                negative: 0,
                tokens: 1,
            }))
        );
    }

    #[test]
    fn unclassified_words_are_persisted_but_not_counted() {
        let doc = Document::new("Meh.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 4))
            .with_annotation(Annotation::new(SENTENCE, 0, 4))
            .with_annotation(word(0, 3, "http://example.com/sentiment#NeutralWord"))
            .with_annotation(Annotation::new(SENTIMENT_WORD, 0, 3));

        let (summary, facts) = run(&doc, CONTENT_BLOCKS);

        assert_eq!(facts.len(), 2);
        assert!(facts.iter().all(|f| matches!(
            f,
            Fact::SentimentWord { polarity: Polarity::Unclassified, .. }
        )));
        assert_eq!(summary.sentiment_words, 2);
        assert!(summary.polarity.is_empty());
        assert_eq!(summary.block_aggregates, 0);
    }

    #[test]
    fn sentence_numbers_continue_across_blocks() {
        // two blocks, one sentence each
        let doc = Document::new("Up. Down.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 3))
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 4, 9))
            .with_annotation(Annotation::new(SENTENCE, 0, 3))
            .with_annotation(Annotation::new(SENTENCE, 4, 9))
            .with_annotation(Annotation::new(TOKEN, 0, 2))
            .with_annotation(Annotation::new(TOKEN, 4, 8))
            .with_annotation(word(0, 2, POSITIVE))
            .with_annotation(word(4, 8, NEGATIVE));

        let (summary, facts) = run(&doc, CONTENT_BLOCKS);

        let words: Vec<(u32, u32)> = facts
            .iter()
            .filter_map(|f| match f {
                Fact::SentimentWord { occurrence, .. } => Some((occurrence.block_num, occurrence.sentence_num)),
                _ => None,
            })
            .collect();
        assert_eq!(words, vec![(1, 1), (2, 2)]);

        let blocks: Vec<&BlockSentiment> = facts
            .iter()
            .filter_map(|f| match f {
                Fact::BlockSentiment(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!((blocks[0].positive, blocks[0].negative), (1, 0));
        assert_eq!((blocks[1].positive, blocks[1].negative), (0, 1));
        assert_eq!(summary.polarity, Tally { positive: 1, negative: 1 });
    }

    #[test]
    fn document_tokens_sum_block_tokens() {
        let doc = Document::new("a b c. d e.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 6))
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 7, 11))
            .with_annotation(Annotation::new(TOKEN, 0, 1))
            .with_annotation(Annotation::new(TOKEN, 2, 3))
            .with_annotation(Annotation::new(TOKEN, 4, 5))
            .with_annotation(Annotation::new(TOKEN, 7, 8))
            .with_annotation(Annotation::new(TOKEN, 9, 10));

        let (summary, facts) = run(&doc, CONTENT_BLOCKS);

        assert!(facts.is_empty());
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.sentences, 0);
        assert_eq!(summary.tokens, 5);
    }

    #[test]
    fn unseen_selector_skips_plain_content_blocks() {
        let doc = Document::new("Seen. Unseen good.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 5))
            .with_annotation(Annotation::new(UNSEEN_CONTENT_BLOCKS, 6, 18))
            .with_annotation(Annotation::new(SENTENCE, 0, 5))
            .with_annotation(Annotation::new(SENTENCE, 6, 18))
            .with_annotation(word(0, 4, POSITIVE))
            .with_annotation(word(13, 17, POSITIVE));

        let (summary, facts) = run(&doc, UNSEEN_CONTENT_BLOCKS);
        assert_eq!(summary.blocks, 1);
        assert_eq!(summary.sentiment_words, 1);
        match &facts[0] {
            Fact::SentimentWord { occurrence, .. } => assert_eq!(occurrence.start, 13),
            other => panic!("expected sentiment word, got {:?}", other),
        }

        // the revision-1 layer sees both blocks through the path prefix
        let (summary, _) = run(&doc, CONTENT_BLOCKS);
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.sentiment_words, 2);
    }

    #[test]
    fn spans_outside_sentences_are_ignored() {
        let doc = Document::new("Title good. Body.")
            .with_annotation(Annotation::new(CONTENT_BLOCKS, 0, 17))
            .with_annotation(Annotation::new(SENTENCE, 12, 17))
            .with_annotation(word(6, 10, POSITIVE));

        let (summary, facts) = run(&doc, CONTENT_BLOCKS);
        assert!(facts.is_empty());
        assert_eq!(summary.sentences, 1);
        assert!(summary.polarity.is_empty());
    }

    struct FailAfter(usize);

    impl FactSink for FailAfter {
        type Error = &'static str;

        fn accept(&mut self, _fact: Fact) -> Result<(), Self::Error> {
            if self.0 == 0 {
                return Err("gateway down");
            }
            self.0 -= 1;
            Ok(())
        }
    }

    #[test]
    fn sink_error_stops_traversal() {
        let doc = two_sentence_document();
        let index = AnnotationIndex::build(&doc).unwrap();
        let mut sink = FailAfter(1);

        let err = extract(&index, CONTENT_BLOCKS, &context(), &mut sink).unwrap_err();
        assert_eq!(err, "gateway down");
    }
}
