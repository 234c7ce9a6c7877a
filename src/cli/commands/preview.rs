//! Preview command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::prepare_documents;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Print the first `count` documents as the records that would be upserted.
pub fn run_preview(input: &Path, count: usize, settings: Settings) -> Result<()> {
    settings.validate()?;

    let documents = prepare_documents(input, &settings)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    Output::info(&format!(
        "Prepared {} records, showing {}",
        documents.len(),
        count.min(documents.len())
    ));

    let records: Vec<Value> = documents
        .iter()
        .take(count)
        .map(|doc| Value::Object(doc.to_record(&settings.ingest.text_field)))
        .collect();

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
