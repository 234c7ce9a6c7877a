//! Stats command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::PineconeClient;
use anyhow::Result;

/// Run the stats command.
pub async fn run_stats(settings: Settings) -> Result<()> {
    preflight::check(Operation::Query, &settings)?;

    let client = PineconeClient::from_settings(&settings)?;
    let spinner = Output::spinner("Fetching index stats...");
    let stats = client.describe_index_stats(&settings.index.name).await;
    spinner.finish_and_clear();
    let stats = stats?;

    Output::header(&format!("Index: {}", settings.index.name));
    if let Some(dimension) = stats.dimension {
        Output::kv("Dimension", &dimension.to_string());
    }
    Output::kv("Total records", &stats.total_record_count.to_string());

    if stats.namespaces.is_empty() {
        Output::warning("The index has no namespaces yet.");
        return Ok(());
    }

    Output::header("Namespaces");
    for (name, ns) in &stats.namespaces {
        let label = if name.is_empty() { "(default)" } else { name.as_str() };
        Output::kv(label, &ns.record_count.to_string());
    }

    Ok(())
}
