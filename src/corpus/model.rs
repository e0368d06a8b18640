//! Corpus, document and annotation records as delivered by the annotation pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// String-keyed feature map attached to corpora, documents and annotations
pub type Features = HashMap<String, String>;

/// Errors that can occur while loading a corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed corpus JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A batch of documents sharing one collection-level `guid` feature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    /// Human-readable corpus name
    #[serde(default)]
    pub name: String,
    /// Collection-level features (`guid`, ...)
    #[serde(default)]
    pub features: Features,
    /// Documents in pipeline order
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Corpus {
    /// Create an empty corpus with the given collection identifier
    pub fn new(name: impl Into<String>, guid: impl Into<String>) -> Self {
        let mut features = Features::new();
        features.insert("guid".to_string(), guid.into());
        Self {
            name: name.into(),
            features,
            documents: Vec::new(),
        }
    }

    /// Add a document
    pub fn with_document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    /// Collection identifier, if present
    pub fn guid(&self) -> Option<&str> {
        self.features.get("guid").map(String::as_str)
    }

    /// Load a corpus from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse a corpus from a JSON string
    pub fn from_json(raw: &str) -> Result<Self, CorpusError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// One annotated document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    /// Full document text; annotation spans index into it by character
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Look up a document feature
    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features.get(key).map(String::as_str)
    }
}

/// A tagged character span `[start, end)` within a document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Selector path, e.g. `TextBlock/Content` or `SentimentWord`
    #[serde(rename = "type")]
    pub kind: String,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub features: Features,
}

impl Annotation {
    pub fn new(kind: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind: kind.into(),
            start,
            end,
            features: Features::new(),
        }
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    /// Look up an annotation feature
    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features.get(key).map(String::as_str)
    }
}
