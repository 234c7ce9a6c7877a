//! In-memory record writer.
//!
//! Backs `--dry-run` and the pipeline tests.

use super::{RecordWriter, UpsertRequest, UpsertResponse};
use crate::document::Document;
use crate::error::{CineloadError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    /// Documents keyed by (index, namespace, id).
    documents: HashMap<(String, String, String), Document>,
    /// Sizes of every submitted batch, in order.
    calls: Vec<usize>,
}

/// In-memory writer with optional failure injection.
#[derive(Default)]
pub struct MemoryWriter {
    state: Mutex<State>,
    fail_on_call: Option<usize>,
}

impl MemoryWriter {
    /// Create a new in-memory writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given 1-based call fail with a transport error.
    pub fn failing_on(call: usize) -> Self {
        Self {
            state: Mutex::default(),
            fail_on_call: Some(call),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sizes of the batches submitted so far.
    pub fn calls(&self) -> Vec<usize> {
        self.state().calls.clone()
    }

    /// Number of distinct stored documents.
    pub fn document_count(&self) -> usize {
        self.state().documents.len()
    }

    /// Look up a stored document.
    pub fn get(&self, index: &str, namespace: &str, id: &str) -> Option<Document> {
        self.state()
            .documents
            .get(&(index.to_string(), namespace.to_string(), id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl RecordWriter for MemoryWriter {
    async fn submit(&self, request: &UpsertRequest<'_>) -> Result<UpsertResponse> {
        let mut state = self.state();
        state.calls.push(request.data.len());

        if self.fail_on_call == Some(state.calls.len()) {
            return Err(CineloadError::Transport {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        for doc in request.data {
            state.documents.insert(
                (
                    request.index_name.to_string(),
                    request.namespace.to_string(),
                    doc.id.clone(),
                ),
                doc.clone(),
            );
        }

        Ok(UpsertResponse {
            upserted_count: request.data.len(),
            message: "stored in memory".to_string(),
        })
    }
}
