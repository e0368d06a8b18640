//! Annotated corpus model
//!
//! Corpora arrive from the annotation pipeline as JSON. Documents are only
//! read; the `AnnotationIndex` is built once per document before traversal.

mod index;
mod model;

pub use index::{AnnotationIndex, IndexError};
pub use model::{Annotation, Corpus, CorpusError, Document, Features};
