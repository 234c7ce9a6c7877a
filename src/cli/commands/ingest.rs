//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{prepare_documents, UploadConfig, UploadEvent, Uploader};
use crate::vector_store::{MemoryWriter, PineconeClient, RecordWriter};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;

/// Run the ingest command.
pub async fn run_ingest(input: &Path, dry_run: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Ingest { dry_run }, &settings)?;

    let documents = prepare_documents(input, &settings)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let writer: Arc<dyn RecordWriter> = if dry_run {
        Output::warning("Dry run: records are not sent to the index.");
        Arc::new(MemoryWriter::new())
    } else {
        Arc::new(PineconeClient::from_settings(&settings)?)
    };

    let config = UploadConfig::from_settings(&settings)?;
    Output::info(&format!(
        "Target: index '{}', namespace '{}'",
        config.index_name, config.namespace
    ));
    let uploader = Uploader::new(config, writer);

    let mut progress: Option<ProgressBar> = None;
    let result = uploader
        .upload_with(&documents, |event| match event {
            UploadEvent::Prepared { documents, batches } => {
                Output::info(&format!("Prepared {} records for upload", documents));
                progress = Some(Output::progress_bar(batches as u64, "batches"));
            }
            UploadEvent::BatchStarted { number, size } => {
                let line = format!("Uploading batch {} ({} records)...", number, size);
                match &progress {
                    Some(pb) => pb.println(line),
                    None => println!("{}", line),
                }
            }
            UploadEvent::BatchCompleted { number, response, .. } => {
                let line = format!("Batch {} upload response: {}", number, response);
                if let Some(pb) = &progress {
                    pb.println(line);
                    pb.inc(1);
                } else {
                    println!("{}", line);
                }
            }
            UploadEvent::BatchFailed { number, error, .. } => {
                if let Some(pb) = &progress {
                    pb.abandon_with_message(format!("batch {} failed", number));
                }
                Output::error(&format!("Batch {} failed: {}", number, error));
            }
        })
        .await;

    let report = result?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Output::success(&format!(
        "Uploaded {} records in {} batches",
        report.upserted(),
        report.batches.len()
    ));
    Ok(())
}
