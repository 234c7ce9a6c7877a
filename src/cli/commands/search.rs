//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{PineconeClient, SearchQuery};
use anyhow::{Context, Result};
use serde_json::Value;

/// Run the search command.
pub async fn run_search(
    query: &str,
    top_k: u32,
    filter: Option<&str>,
    settings: Settings,
) -> Result<()> {
    if top_k == 0 {
        anyhow::bail!("--top-k must be at least 1");
    }
    preflight::check(Operation::Query, &settings)?;

    let mut search = SearchQuery::new(query, top_k);
    if let Some(filter) = filter {
        let filter: Value =
            serde_json::from_str(filter).context("--filter is not valid JSON")?;
        search = search.with_filter(filter);
    }

    let client = PineconeClient::from_settings(&settings)?;
    let spinner = Output::spinner("Searching...");
    let response = client
        .search_records(&settings.index.name, &settings.index.namespace, &search)
        .await;
    spinner.finish_and_clear();
    let response = response?;

    let hits = hits(&response);
    if hits.is_empty() {
        Output::warning("No results found matching your query.");
        return Ok(());
    }

    Output::success(&format!("Found {} results", hits.len()));
    for (rank, hit) in hits.iter().enumerate() {
        let id = hit.get("_id").and_then(Value::as_str).unwrap_or("?");
        let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);
        let text = hit
            .get("fields")
            .and_then(|fields| fields.get(&settings.ingest.text_field))
            .and_then(Value::as_str)
            .unwrap_or("");
        Output::search_hit(rank + 1, id, score, text);
    }

    Ok(())
}

/// Extract `result.hits` from a search response.
fn hits(response: &Value) -> &[Value] {
    response
        .pointer("/result/hits")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hits_extraction() {
        let response = json!({
            "result": {"hits": [
                {"_id": "tt0017136", "_score": 0.82, "fields": {"text": "Title: Metropolis (1927)"}}
            ]},
            "usage": {"read_units": 6}
        });
        assert_eq!(hits(&response).len(), 1);
        assert!(hits(&json!({"usage": {}})).is_empty());
    }
}
