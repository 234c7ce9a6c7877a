//! Partitioning documents into bounded, ordered batches.

use crate::document::Document;
use std::num::NonZeroUsize;

/// Default number of documents per upsert call.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A bounded group of consecutive documents sent in one call.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// 1-based position of this batch in the sequence.
    pub number: usize,
    pub documents: &'a [Document],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Lazily split `documents` into batches of at most `size`, in order.
///
/// Empty input yields no batches; the final batch may be shorter.
pub fn batches(documents: &[Document], size: NonZeroUsize) -> impl Iterator<Item = Batch<'_>> {
    documents
        .chunks(size.get())
        .enumerate()
        .map(|(i, documents)| Batch {
            number: i + 1,
            documents,
        })
}

/// Number of batches `len` documents split into.
pub fn batch_count(len: usize, size: NonZeroUsize) -> usize {
    len.div_ceil(size.get())
}
