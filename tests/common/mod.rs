//! Common test utilities for corpus ingestion tests
//!
//! `DocumentBuilder` lays out sentences as text and records the matching
//! block, sentence, token and sentiment spans, so tests describe documents
//! by content instead of hand-computed offsets.

#![allow(dead_code)]

use corpus_facts::{Annotation, Document};

pub const CORPUS_GUID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";
pub const POSITIVE: &str = "http://example.com/sentiment#PositiveWord";
pub const NEGATIVE: &str = "http://example.com/sentiment#NegativeWord";
pub const NEUTRAL: &str = "http://example.com/sentiment#NeutralWord";

/// A word inside a sentence and the annotation it should carry
#[derive(Debug, Clone)]
pub enum Mark {
    Plain,
    Object(&'static str),
    Word(&'static str),
}

pub struct DocumentBuilder {
    text: String,
    features: Vec<(String, String)>,
    annotations: Vec<Annotation>,
    block_kind: String,
    /// Start and kind of the block being written
    open_block: Option<(usize, String)>,
}

impl DocumentBuilder {
    /// A document with every mandatory feature set
    pub fn new(guid: &str) -> Self {
        Self {
            text: String::new(),
            features: vec![
                ("guid".to_string(), guid.to_string()),
                ("time".to_string(), "2024-01-10 08:30:00".to_string()),
                ("pumpIndex".to_string(), "0.5".to_string()),
                ("rev".to_string(), "1".to_string()),
            ],
            annotations: Vec::new(),
            block_kind: "TextBlock/Content".to_string(),
            open_block: None,
        }
    }

    pub fn feature(mut self, key: &str, value: &str) -> Self {
        self.features.retain(|(k, _)| k != key);
        self.features.push((key.to_string(), value.to_string()));
        self
    }

    pub fn without_feature(mut self, key: &str) -> Self {
        self.features.retain(|(k, _)| k != key);
        self
    }

    /// Kind used for blocks opened after this call
    pub fn block_kind(mut self, kind: &str) -> Self {
        self.block_kind = kind.to_string();
        self
    }

    /// Open a block; closes the previous one
    pub fn block(mut self) -> Self {
        self.close_block();
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.open_block = Some((self.char_len(), self.block_kind.clone()));
        self
    }

    /// Append a sentence made of marked words, tokenized on the given words
    pub fn sentence(mut self, words: &[(&str, Mark)]) -> Self {
        if self.open_block.is_none() {
            self = self.block();
        }
        let block_start = self.open_block.as_ref().map(|(start, _)| *start).unwrap_or(0);
        if self.char_len() > block_start {
            self.text.push(' ');
        }
        let sentence_start = self.char_len();
        for (i, (word, mark)) in words.iter().enumerate() {
            if i > 0 {
                self.text.push(' ');
            }
            let start = self.char_len();
            self.text.push_str(word);
            let end = self.char_len();
            self.annotations.push(Annotation::new("Token", start, end));
            match mark {
                Mark::Plain => {}
                Mark::Object(uri) => self.annotations.push(
                    Annotation::new("SentimentObject", start, end).with_feature("instanceUri", *uri),
                ),
                Mark::Word(class_uri) => self.annotations.push(
                    Annotation::new("SentimentWord", start, end)
                        .with_feature("instanceUri", format!("http://example.com/words#{}", word.to_lowercase()))
                        .with_feature("instanceClassUri", *class_uri),
                ),
            }
        }
        self.text.push('.');
        let end = self.char_len();
        self.annotations.push(Annotation::new("Sentence", sentence_start, end));
        self
    }

    pub fn build(mut self) -> Document {
        self.close_block();
        let mut doc = Document::new(self.text);
        for (k, v) in self.features {
            doc = doc.with_feature(k, v);
        }
        for a in self.annotations {
            doc = doc.with_annotation(a);
        }
        doc
    }

    fn close_block(&mut self) {
        if let Some((start, kind)) = self.open_block.take() {
            let end = self.char_len();
            self.annotations.push(Annotation::new(kind, start, end));
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

pub fn plain(word: &str) -> (&str, Mark) {
    (word, Mark::Plain)
}

pub fn object<'a>(word: &'a str, uri: &'static str) -> (&'a str, Mark) {
    (word, Mark::Object(uri))
}

pub fn positive(word: &str) -> (&str, Mark) {
    (word, Mark::Word(POSITIVE))
}

pub fn negative(word: &str) -> (&str, Mark) {
    (word, Mark::Word(NEGATIVE))
}

pub fn neutral(word: &str) -> (&str, Mark) {
    (word, Mark::Word(NEUTRAL))
}
