//! Vector index abstraction for cineload.
//!
//! The ingestion pipeline only needs one remote operation, submitting an
//! upsert request, so that is the whole [`RecordWriter`] trait. The Pinecone
//! client adds search and stats on top for the CLI and MCP server.

mod memory;
mod pinecone;
mod record;

pub use memory::MemoryWriter;
pub use pinecone::{IndexDescription, IndexStats, NamespaceStats, PineconeClient, SearchQuery};
pub use record::validate_records;

use crate::document::Document;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// One upsert call: a batch of documents addressed to an index namespace.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest<'a> {
    pub index_name: &'a str,
    pub namespace: &'a str,
    pub data: &'a [Document],
}

/// Acknowledgment for a submitted batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    /// Number of records the index accepted.
    pub upserted_count: usize,
    /// Short status reported by the writer.
    pub message: String,
}

impl fmt::Display for UpsertResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} records)", self.message, self.upserted_count)
    }
}

/// Remote write operation used by the upload driver.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    /// Submit one batch. Fails on transport or service errors.
    async fn submit(&self, request: &UpsertRequest<'_>) -> Result<UpsertResponse>;
}
