//! MCP server implementation.

use super::protocol::*;
use super::tools::{
    get_tools, DESCRIBE_INDEX, DESCRIBE_INDEX_STATS, LIST_INDEXES, SEARCH_RECORDS, UPSERT_RECORDS,
};
use crate::config::Settings;
use crate::error::Result as CineloadResult;
use crate::vector_store::{validate_records, PineconeClient, SearchQuery};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "cineload";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "This server manages records in Pinecone indexes. \
Use describe-index-stats to find namespaces and record counts. Use upsert-records \
to insert documents with a consistent schema per namespace; only the text field is \
embedded, other fields are metadata for filtering. Use search-records to query a \
namespace by text, adding a metadata filter only when a specific value or range is \
requested.";

#[derive(Debug, Deserialize)]
struct UpsertArgs {
    name: String,
    namespace: String,
    records: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    name: String,
    namespace: String,
    query: SearchQuery,
}

/// Arguments of the tools that take only an index name.
#[derive(Debug, Deserialize)]
struct IndexNameArgs {
    name: String,
}

/// Index client lifecycle. A client that cannot be built leaves the server
/// running; index tools then answer with the reason.
enum ClientState {
    Pending,
    Ready(PineconeClient),
    Unavailable(String),
}

/// MCP server exposing index tools over stdio.
pub struct McpServer {
    settings: Settings,
    client: ClientState,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            client: ClientState::Pending,
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock()).await
    }

    /// Serve newline-delimited JSON-RPC messages until `input` closes.
    pub async fn serve<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> anyhow::Result<()> {
        info!("MCP server starting");

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"))
                }
            };

            if let Some(response) = response {
                writeln!(output, "{}", serde_json::to_string(&response)?)?;
                output.flush()?;
            }
        }

        info!("MCP input closed, shutting down");
        Ok(())
    }

    /// Handle one message. Notifications produce no response.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Received {}", request.method);

        if request.is_notification() {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn connect(&mut self, client: CineloadResult<PineconeClient>) {
        self.client = match client {
            Ok(client) => {
                info!("Index client initialized");
                ClientState::Ready(client)
            }
            Err(e) => {
                warn!("Index tools disabled: {}", e);
                ClientState::Unavailable(e.to_string())
            }
        };
    }

    fn handle_initialize(&mut self, id: Option<Value>) -> JsonRpcResponse {
        if matches!(self.client, ClientState::Pending) {
            let client = PineconeClient::from_settings(&self.settings);
            self.connect(client);
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: SERVER_VERSION,
            },
            instructions: INSTRUCTIONS,
        };
        to_response(id, &result)
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        to_response(id, &json!({ "tools": get_tools() }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value::<ToolCallParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let result = match params.name.as_str() {
            UPSERT_RECORDS => self.tool_upsert_records(params.arguments).await,
            SEARCH_RECORDS => self.tool_search_records(params.arguments).await,
            DESCRIBE_INDEX_STATS => self.tool_describe_index_stats(params.arguments).await,
            DESCRIBE_INDEX => self.tool_describe_index(params.arguments).await,
            LIST_INDEXES => self.tool_list_indexes().await,
            other => ToolCallResult::error(format!("Unknown tool: {}", other)),
        };

        to_response(id, &result)
    }

    fn client(&self) -> Result<&PineconeClient, ToolCallResult> {
        match &self.client {
            ClientState::Ready(client) => Ok(client),
            ClientState::Pending => Err(ToolCallResult::error("Server not initialized")),
            ClientState::Unavailable(reason) => Err(ToolCallResult::error(format!(
                "Index tools unavailable: {}",
                reason
            ))),
        }
    }

    async fn tool_upsert_records(&self, args: Value) -> ToolCallResult {
        let args: UpsertArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        if let Err(e) = validate_records(&args.records) {
            return ToolCallResult::error(e.to_string());
        }
        let records: Vec<Map<String, Value>> =
            args.records.into_iter().filter_map(into_record).collect();

        let client = match self.client() {
            Ok(c) => c,
            Err(e) => return e,
        };

        match client
            .upsert_records(&args.name, &args.namespace, &records)
            .await
        {
            Ok(()) => ToolCallResult::text("Data upserted successfully"),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    async fn tool_search_records(&self, args: Value) -> ToolCallResult {
        let args: SearchArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };
        if args.query.top_k == 0 {
            return ToolCallResult::error("query.topK: Expected a positive number");
        }

        let client = match self.client() {
            Ok(c) => c,
            Err(e) => return e,
        };

        match client
            .search_records(&args.name, &args.namespace, &args.query)
            .await
        {
            Ok(results) => ToolCallResult::json(&results),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    async fn tool_describe_index_stats(&self, args: Value) -> ToolCallResult {
        let args: IndexNameArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        let client = match self.client() {
            Ok(c) => c,
            Err(e) => return e,
        };

        match client.describe_index_stats(&args.name).await {
            Ok(stats) => ToolCallResult::json(&stats),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    async fn tool_describe_index(&self, args: Value) -> ToolCallResult {
        let args: IndexNameArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        let client = match self.client() {
            Ok(c) => c,
            Err(e) => return e,
        };

        match client.describe_index(&args.name).await {
            Ok(description) => ToolCallResult::json(&description),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    async fn tool_list_indexes(&self) -> ToolCallResult {
        let client = match self.client() {
            Ok(c) => c,
            Err(e) => return e,
        };

        match client.list_indexes().await {
            Ok(indexes) => ToolCallResult::json(&json!({ "indexes": indexes })),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolCallResult> {
    serde_json::from_value(args)
        .map_err(|e| ToolCallResult::error(format!("Invalid arguments: {}", e)))
}

/// Accept `id` as an alias for the `_id` field the service expects.
fn into_record(value: Value) -> Option<Map<String, Value>> {
    let Value::Object(mut record) = value else {
        return None;
    };
    let has_string_id = |key: &str, record: &Map<String, Value>| {
        record.get(key).is_some_and(Value::is_string)
    };
    if !has_string_id("_id", &record) && has_string_id("id", &record) {
        if let Some(id) = record.remove("id") {
            record.insert("_id".to_string(), id);
        }
    }
    Some(record)
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, SERVER_ERROR, format!("Failed to encode: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CineloadError;

    async fn exchange(server: &mut McpServer, lines: &[Value]) -> Vec<Value> {
        let input: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })
    }

    fn tool_text(response: &Value) -> &str {
        response["result"]["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_tools_list() {
        let mut server = McpServer::new(Settings::default());
        let responses = exchange(
            &mut server,
            &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})],
        )
        .await;

        let tools = responses[0]["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "list-indexes",
                "describe-index",
                "upsert-records",
                "search-records",
                "describe-index-stats"
            ]
        );
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let mut server = McpServer::new(Settings::default());
        let responses = exchange(
            &mut server,
            &[
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                json!({"jsonrpc": "2.0", "id": 7, "method": "ping"}),
            ],
        )
        .await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 7);
    }

    #[tokio::test]
    async fn test_parse_error_and_unknown_method() {
        let mut server = McpServer::new(Settings::default());
        let input = "not json\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"resources/list\"}\n";
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_records() {
        let mut server = McpServer::new(Settings::default());
        let responses = exchange(
            &mut server,
            &[tool_call(
                3,
                "upsert-records",
                json!({
                    "name": "imdb-movies",
                    "namespace": "movies",
                    "records": [{"id": "tt1", "text": "Heat"}, {"text": "no id"}]
                }),
            )],
        )
        .await;

        assert_eq!(responses[0]["result"]["isError"], true);
        assert!(tool_text(&responses[0]).contains("records[1]"));
    }

    #[tokio::test]
    async fn test_tool_arguments_checked_before_client() {
        let mut server = McpServer::new(Settings::default());
        let responses = exchange(
            &mut server,
            &[
                tool_call(4, "search-records", json!({"name": "imdb-movies"})),
                tool_call(5, "describe-index-stats", json!({"name": "imdb-movies"})),
                tool_call(6, "delete-index", json!({})),
                tool_call(7, "describe-index", json!({})),
                tool_call(8, "list-indexes", json!({})),
            ],
        )
        .await;

        assert!(tool_text(&responses[0]).starts_with("Invalid arguments"));
        assert_eq!(tool_text(&responses[1]), "Server not initialized");
        assert_eq!(tool_text(&responses[2]), "Unknown tool: delete-index");
        assert!(tool_text(&responses[3]).starts_with("Invalid arguments"));
        assert_eq!(tool_text(&responses[4]), "Server not initialized");
    }

    #[test]
    fn test_into_record_renames_id() {
        let record = into_record(json!({"id": "tt1", "text": "Heat"})).unwrap();
        assert_eq!(record["_id"], "tt1");
        assert!(!record.contains_key("id"));

        let record = into_record(json!({"_id": "tt2", "id": "x"})).unwrap();
        assert_eq!(record["_id"], "tt2");
        assert_eq!(record["id"], "x");

        let record = into_record(json!({"_id": false, "id": "tt3"})).unwrap();
        assert_eq!(record["_id"], "tt3");
    }

    fn initialize() -> Value {
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})
    }

    #[tokio::test]
    async fn test_handshake_without_api_key() {
        let mut server = McpServer::new(Settings::default());
        server.connect(Err(CineloadError::Config(
            "PINECONE_API_KEY environment variable is not set".to_string(),
        )));

        let responses = exchange(
            &mut server,
            &[
                initialize(),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
                tool_call(3, "list-indexes", json!({})),
            ],
        )
        .await;

        assert_eq!(responses.len(), 3);
        assert!(responses[0].get("error").is_none());
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "cineload");
        assert!(responses[1]["result"]["tools"].is_array());
        assert_eq!(responses[2]["result"]["isError"], true);
        assert!(tool_text(&responses[2]).contains("PINECONE_API_KEY"));
    }

    #[tokio::test]
    async fn test_initialize_succeeds_when_client_cannot_be_built() {
        let mut settings = Settings::default();
        settings.index.control_plane_url = "not a url".to_string();
        let mut server = McpServer::new(settings);

        let responses = exchange(
            &mut server,
            &[
                initialize(),
                tool_call(2, "describe-index", json!({"name": "imdb-movies"})),
            ],
        )
        .await;

        assert_eq!(responses[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(responses[1]["result"]["isError"], true);
        assert!(tool_text(&responses[1]).starts_with("Index tools unavailable"));
    }
}
