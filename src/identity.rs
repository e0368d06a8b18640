//! Deterministic document identity
//!
//! A document's persistent identity is the MD5 digest of its corpus GUID
//! followed by its own GUID. GUID bytes use the mixed-endian layout (first
//! three fields little-endian) that existing rows were written with, both
//! when feeding the digest and when reading the digest back as a GUID.

use uuid::Uuid;

/// Derive the document identity from `(corpus, document)`.
///
/// Pure and order sensitive: swapping the arguments yields a different id.
pub fn derive_document_id(corpus: Uuid, document: Uuid) -> Uuid {
    let mut buffer = [0u8; 32];
    buffer[..16].copy_from_slice(&corpus.to_bytes_le());
    buffer[16..].copy_from_slice(&document.to_bytes_le());
    let digest = md5::compute(buffer);
    Uuid::from_bytes_le(digest.0)
}
