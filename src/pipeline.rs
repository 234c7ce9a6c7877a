//! Ingestion pipeline for cineload.
//!
//! Reads rows, normalizes them into documents and drives the sequential
//! batch upload against a [`RecordWriter`].

use crate::batch::{batch_count, batches};
use crate::config::Settings;
use crate::document::{Document, Normalizer};
use crate::error::{CineloadError, Result};
use crate::source::read_rows;
use crate::vector_store::{RecordWriter, UpsertRequest, UpsertResponse};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Explicit configuration for the upload driver.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub index_name: String,
    pub namespace: String,
    pub batch_size: NonZeroUsize,
}

impl UploadConfig {
    /// Build from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            index_name: settings.index.name.clone(),
            namespace: settings.index.namespace.clone(),
            batch_size: settings.ingest.batch_size()?,
        })
    }
}

/// Progress notifications emitted while uploading.
#[derive(Debug)]
pub enum UploadEvent<'a> {
    /// Emitted once before the first batch.
    Prepared { documents: usize, batches: usize },
    /// A batch is about to be submitted.
    BatchStarted { number: usize, size: usize },
    /// A batch was acknowledged.
    BatchCompleted {
        number: usize,
        size: usize,
        response: &'a UpsertResponse,
    },
    /// A batch failed; no further batches will be sent.
    BatchFailed {
        number: usize,
        size: usize,
        error: &'a CineloadError,
    },
}

/// Outcome of one acknowledged batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub number: usize,
    pub size: usize,
    pub response: UpsertResponse,
}

/// Outcome of a full upload.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub documents: usize,
    pub batches: Vec<BatchReport>,
}

impl UploadReport {
    /// Total records the writer acknowledged.
    pub fn upserted(&self) -> usize {
        self.batches.iter().map(|b| b.response.upserted_count).sum()
    }
}

/// Sends document batches to the index one at a time, in order.
pub struct Uploader {
    config: UploadConfig,
    writer: Arc<dyn RecordWriter>,
}

impl Uploader {
    pub fn new(config: UploadConfig, writer: Arc<dyn RecordWriter>) -> Self {
        Self { config, writer }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload without progress reporting.
    pub async fn upload(&self, documents: &[Document]) -> Result<UploadReport> {
        self.upload_with(documents, |_| {}).await
    }

    /// Upload every document, reporting each batch through `on_event`.
    ///
    /// Batches are submitted sequentially and the first failure aborts the
    /// run. Batches acknowledged before the failure stay in the index.
    #[instrument(skip_all, fields(
        index = %self.config.index_name,
        namespace = %self.config.namespace,
        documents = documents.len(),
    ))]
    pub async fn upload_with<F>(&self, documents: &[Document], mut on_event: F) -> Result<UploadReport>
    where
        F: FnMut(UploadEvent<'_>) + Send,
    {
        let total_batches = batch_count(documents.len(), self.config.batch_size);
        info!(
            "Prepared {} records for upload in {} batches",
            documents.len(),
            total_batches
        );
        on_event(UploadEvent::Prepared {
            documents: documents.len(),
            batches: total_batches,
        });

        let mut report = UploadReport {
            documents: documents.len(),
            batches: Vec::with_capacity(total_batches),
        };

        for batch in batches(documents, self.config.batch_size) {
            let size = batch.len();
            on_event(UploadEvent::BatchStarted {
                number: batch.number,
                size,
            });

            let request = UpsertRequest {
                index_name: &self.config.index_name,
                namespace: &self.config.namespace,
                data: batch.documents,
            };

            match self.writer.submit(&request).await {
                Ok(response) => {
                    info!("Batch {} upload response: {}", batch.number, response);
                    on_event(UploadEvent::BatchCompleted {
                        number: batch.number,
                        size,
                        response: &response,
                    });
                    report.batches.push(BatchReport {
                        number: batch.number,
                        size,
                        response,
                    });
                }
                Err(e) => {
                    warn!("Batch {} failed: {}", batch.number, e);
                    on_event(UploadEvent::BatchFailed {
                        number: batch.number,
                        size,
                        error: &e,
                    });
                    return Err(CineloadError::Upload {
                        batch: batch.number,
                        acknowledged: report.batches.len(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Read and normalize the input file into documents.
pub fn prepare_documents(path: &Path, settings: &Settings) -> Result<Vec<Document>> {
    let rows = read_rows(path, &settings.ingest)?;
    let normalizer = Normalizer::new(&settings.ingest.id_metadata_key);
    Ok(normalizer.normalize_all(&rows))
}
