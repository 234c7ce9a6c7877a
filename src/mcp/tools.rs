//! MCP tool definitions for cineload.

use super::protocol::Tool;
use serde_json::json;

pub const UPSERT_RECORDS: &str = "upsert-records";
pub const SEARCH_RECORDS: &str = "search-records";
pub const DESCRIBE_INDEX_STATS: &str = "describe-index-stats";
pub const DESCRIBE_INDEX: &str = "describe-index";
pub const LIST_INDEXES: &str = "list-indexes";

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: LIST_INDEXES,
            description: "List all Pinecone indexes in the project.",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: DESCRIBE_INDEX,
            description: "Describe the configuration of a Pinecone index. For indexes with \
                integrated embedding, \"embed.field_map\" names the record field whose text \
                is embedded; upserted records must carry that field.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "The name of the index to describe." }
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: UPSERT_RECORDS,
            description: "Insert or update records in a Pinecone index. Every record needs an \
                \"id\" or \"_id\" field and the text field named in the index's \
                \"embed.field_map\" (see describe-index). Other fields are stored as \
                metadata and must be strings, numbers, booleans or arrays of strings.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "The index to upsert into." },
                    "namespace": { "type": "string", "description": "The namespace to upsert into." },
                    "records": {
                        "type": "array",
                        "description": "Records to upsert. Use a consistent schema for all records in a namespace.",
                        "items": { "type": "object" }
                    }
                },
                "required": ["name", "namespace", "records"]
            }),
        },
        Tool {
            name: SEARCH_RECORDS,
            description: "Search a namespace for records similar to the query text. \
                Use \"query.filter\" only when a specific value or range is needed; \
                overly strict filters return nothing. Supported operators: $eq, $ne, \
                $gt, $gte, $lt, $lte, $in, $nin, $exists, $and, $or.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "The index to search." },
                    "namespace": { "type": "string", "description": "The namespace to search." },
                    "query": {
                        "type": "object",
                        "properties": {
                            "topK": { "type": "integer", "description": "Number of results to return." },
                            "inputs": {
                                "type": "object",
                                "properties": {
                                    "text": { "type": "string", "description": "The text to search for." }
                                },
                                "required": ["text"]
                            },
                            "filter": { "type": "object", "description": "Optional metadata filter." }
                        },
                        "required": ["topK", "inputs"]
                    }
                },
                "required": ["name", "namespace", "query"]
            }),
        },
        Tool {
            name: DESCRIBE_INDEX_STATS,
            description: "Describe the statistics of a Pinecone index: \"totalRecordCount\" \
                and the record count of every namespace.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "The index to describe." }
                },
                "required": ["name"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_unique() {
        let tools = get_tools();
        let mut names: Vec<_> = tools.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_schemas_declare_required_fields() {
        for tool in get_tools().into_iter().filter(|t| t.name != LIST_INDEXES) {
            let required = tool.input_schema["required"].as_array().unwrap();
            assert!(required.iter().any(|r| r == "name"), "{}", tool.name);
        }
    }
}
