//! Per-document failures

use crate::corpus::IndexError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that abort one document. The batch moves on to the next document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("missing required feature '{0}'")]
    MissingFeature(&'static str),

    #[error("unparseable timestamp in '{feature}': {value:?}")]
    InvalidTimestamp { feature: &'static str, value: String },

    #[error("unparseable score in 'pumpIndex': {0:?}")]
    InvalidScore(String),

    #[error("missing {0} guid")]
    MissingGuid(&'static str),

    #[error("malformed {scope} guid {value:?}: {source}")]
    InvalidGuid {
        scope: &'static str,
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
