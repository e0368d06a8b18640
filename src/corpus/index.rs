//! Annotation index: selector and range queries over one document's spans
//!
//! The document's annotation list is the arena. The index keeps, per selector
//! path prefix, the arena positions of matching spans sorted in document order,
//! so "spans of kind X inside [start, end)" is a binary search plus a short scan.

use super::model::{Annotation, Document};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while indexing a document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("{kind} span [{start}, {end}) lies outside the document text ({len} chars)")]
    SpanOutOfBounds {
        kind: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Read-only index over a document's annotations
#[derive(Debug)]
pub struct AnnotationIndex<'d> {
    document: &'d Document,
    /// Byte offset of every character boundary; `byte_offsets[char_len]` is `text.len()`
    byte_offsets: Vec<usize>,
    by_selector: HashMap<&'d str, Vec<usize>>,
}

impl<'d> AnnotationIndex<'d> {
    /// Build the index once, before traversal.
    ///
    /// A span of kind `A/B/C` is reachable through the selectors `A`, `A/B`
    /// and `A/B/C`.
    pub fn build(document: &'d Document) -> Result<Self, IndexError> {
        let mut byte_offsets: Vec<usize> = document.text.char_indices().map(|(b, _)| b).collect();
        byte_offsets.push(document.text.len());
        let char_len = byte_offsets.len() - 1;

        let mut by_selector: HashMap<&'d str, Vec<usize>> = HashMap::new();
        for (pos, annotation) in document.annotations.iter().enumerate() {
            if annotation.start > annotation.end || annotation.end > char_len {
                return Err(IndexError::SpanOutOfBounds {
                    kind: annotation.kind.clone(),
                    start: annotation.start,
                    end: annotation.end,
                    len: char_len,
                });
            }
            for selector in selector_prefixes(&annotation.kind) {
                by_selector.entry(selector).or_default().push(pos);
            }
        }

        let annotations = &document.annotations;
        for positions in by_selector.values_mut() {
            // stable: equal spans keep their pipeline order
            positions.sort_by_key(|&p| (annotations[p].start, annotations[p].end));
        }

        Ok(Self {
            document,
            byte_offsets,
            by_selector,
        })
    }

    /// The indexed document
    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// All spans matching `selector`, in document order
    pub fn all<'a>(&'a self, selector: &str) -> impl Iterator<Item = &'d Annotation> + 'a {
        let document: &'d Document = self.document;
        let annotations = &document.annotations;
        self.positions(selector).iter().map(move |&p| &annotations[p])
    }

    /// Spans matching `selector` that lie inside `[start, end)`, in document order
    pub fn within<'a>(
        &'a self,
        selector: &str,
        start: usize,
        end: usize,
    ) -> impl Iterator<Item = &'d Annotation> + 'a {
        let document: &'d Document = self.document;
        let annotations = &document.annotations;
        let positions = self.positions(selector);
        let first = positions.partition_point(|&p| annotations[p].start < start);
        positions[first..]
            .iter()
            .map(move |&p| &annotations[p])
            .take_while(move |a| a.start <= end)
            .filter(move |a| a.end <= end)
    }

    /// Number of spans matching `selector` inside `[start, end)`
    pub fn count_within(&self, selector: &str, start: usize, end: usize) -> usize {
        self.within(selector, start, end).count()
    }

    /// Text covered by a span of this document
    pub fn covered_text(&self, annotation: &Annotation) -> &'d str {
        let document: &'d Document = self.document;
        let text = document.text.as_str();
        match (
            self.byte_offsets.get(annotation.start),
            self.byte_offsets.get(annotation.end),
        ) {
            (Some(&from), Some(&to)) if from <= to => &text[from..to],
            _ => "",
        }
    }

    fn positions(&self, selector: &str) -> &[usize] {
        self.by_selector
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// `A/B/C` -> `A`, `A/B`, `A/B/C`
fn selector_prefixes(kind: &str) -> impl Iterator<Item = &str> {
    kind.match_indices('/')
        .map(move |(i, _)| &kind[..i])
        .chain(std::iter::once(kind))
}
