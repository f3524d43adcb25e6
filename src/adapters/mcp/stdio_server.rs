//! MCP stdio server implementing JSON-RPC 2.0 over stdin/stdout.
//!
//! Exposes ingestion, querying and reset as tools for an agent host.
//!
//! Protocol: newline-delimited JSON-RPC 2.0 on stdin/stdout.
//! Logging goes to stderr (stdout is reserved for protocol messages).

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::domain::models::{IngestOptions, QueryResult, Source, DEFAULT_CHUNK_OVERLAP};
use crate::services::rag_service::DEFAULT_NUM_RESULTS;
use crate::services::RagService;

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

const fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

const fn default_num_results() -> usize {
    DEFAULT_NUM_RESULTS
}

#[derive(Debug, Deserialize)]
struct IngestFileArgs {
    file_paths: Vec<String>,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default = "default_chunk_overlap")]
    chunk_overlap: usize,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct IngestTextArgs {
    text_content: String,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default = "default_chunk_overlap")]
    chunk_overlap: usize,
    #[serde(default)]
    source_name: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query_text: String,
    #[serde(default = "default_num_results")]
    num_results: usize,
}

/// Outcome of a tool call before it is wrapped in a JSON-RPC envelope.
enum ToolOutcome {
    Text(String),
    Failed(String),
    BadArguments(String),
}

/// MCP stdio server backed by one injected [`RagService`].
pub struct StdioServer {
    service: Arc<RagService>,
}

impl StdioServer {
    pub const fn new(service: Arc<RagService>) -> Self {
        Self { service }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve newline-delimited requests from `reader`, writing one response
    /// line per request to `writer`. Notifications get no response.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        tracing::info!("MCP stdio server started");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        tracing::info!("MCP stdio server stopped");
        Ok(())
    }

    /// Handle one request line. `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("Parse error: {e}"),
                ));
            }
        };

        let id = request.get("id").cloned();
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        tracing::debug!(method, "MCP request");

        if method.starts_with("notifications/") {
            return None;
        }

        let id = id.unwrap_or(Value::Null);
        let response = match method {
            "initialize" => success_response(id, initialize_result()),
            "tools/list" => success_response(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, &params).await,
            "ping" => success_response(id, json!({})),
            _ => error_response(id, METHOD_NOT_FOUND, &format!("Method not found: {method}")),
        };
        Some(response)
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> String {
        let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let outcome = match tool_name {
            "ingest_file" => self.tool_ingest_file(arguments).await,
            "ingest_text" => self.tool_ingest_text(arguments).await,
            "query" => self.tool_query(arguments).await,
            "reset_vector_store" => self.tool_reset_vector_store().await,
            _ => ToolOutcome::BadArguments(format!("Unknown tool: {tool_name}")),
        };

        match outcome {
            ToolOutcome::Text(text) => success_response(
                id,
                json!({ "content": [{ "type": "text", "text": text }] }),
            ),
            ToolOutcome::Failed(text) => success_response(
                id,
                json!({ "content": [{ "type": "text", "text": text }], "isError": true }),
            ),
            ToolOutcome::BadArguments(message) => error_response(id, INVALID_PARAMS, &message),
        }
    }

    async fn tool_ingest_file(&self, arguments: Value) -> ToolOutcome {
        let args: IngestFileArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };

        let options = IngestOptions {
            chunk_size: args.chunk_size,
            chunk_overlap: args.chunk_overlap,
            source_name: None,
            tags: args.tags.unwrap_or_default(),
        };

        let report = self.service.ingest_many(&args.file_paths, &options).await;
        ToolOutcome::Text(report.summary())
    }

    async fn tool_ingest_text(&self, arguments: Value) -> ToolOutcome {
        let args: IngestTextArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };

        let options = IngestOptions {
            chunk_size: args.chunk_size,
            chunk_overlap: args.chunk_overlap,
            source_name: args.source_name,
            tags: args.tags.unwrap_or_default(),
        };

        match self
            .service
            .ingest(Source::literal(args.text_content), &options)
            .await
        {
            Ok(_) => ToolOutcome::Text("Text content successfully ingested.".to_string()),
            Err(e) => {
                tracing::error!(error = %e, "Error ingesting text");
                ToolOutcome::Failed(format!("Failed to ingest text: {e}"))
            }
        }
    }

    async fn tool_query(&self, arguments: Value) -> ToolOutcome {
        let args: QueryArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };

        match self.service.query(&args.query_text, args.num_results).await {
            Ok(results) => {
                let formatted: Vec<Value> = results.iter().map(format_result).collect();
                ToolOutcome::Text(Value::Array(formatted).to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error during query");
                ToolOutcome::Failed(format!("Failed to perform query: {e}"))
            }
        }
    }

    async fn tool_reset_vector_store(&self) -> ToolOutcome {
        match self.service.reset_vector_store().await {
            Ok(()) => ToolOutcome::Text("Vector store has been successfully reset.".to_string()),
            Err(e) => {
                tracing::error!(error = %e, "Error resetting vector store");
                ToolOutcome::Failed(format!("Failed to reset vector store: {e}"))
            }
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolOutcome> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolOutcome::BadArguments(format!("Invalid arguments: {e}")))
}

fn format_result(result: &QueryResult) -> Value {
    let mut value = json!({
        "result_number": result.rank,
        "source": result.metadata.source,
        "chunk_index": result.metadata.chunk_index,
        "timestamp": result.metadata.timestamp,
        "distance": result.formatted_distance(),
        "document": result.document,
    });
    if !result.metadata.tags.is_empty() {
        value["tags"] = json!(result.metadata.tags);
    }
    value
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "rag-mcp",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "ingest_file",
            "description": "Ingest one or more plain-text (.txt) files into the RAG store. Each entry may be a path or a glob pattern. Returns a summary of ingested and skipped/failed files.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_paths": { "type": "array", "items": { "type": "string" }, "description": "Paths or glob patterns of files to ingest" },
                    "chunk_size": { "type": "integer", "minimum": 1, "description": "Maximum tokens per chunk. Defaults to, and is capped at, the embedding model's input limit." },
                    "chunk_overlap": { "type": "integer", "minimum": 0, "description": "Tokens shared between consecutive chunks (default: 50)" },
                    "tags": { "type": "array", "items": { "type": "string" }, "description": "Tags stored with every chunk" }
                },
                "required": ["file_paths"]
            }
        },
        {
            "name": "ingest_text",
            "description": "Ingest a text string directly into the RAG store.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "text_content": { "type": "string", "description": "The text to ingest" },
                    "chunk_size": { "type": "integer", "minimum": 1, "description": "Maximum tokens per chunk" },
                    "chunk_overlap": { "type": "integer", "minimum": 0, "description": "Tokens shared between consecutive chunks (default: 50)" },
                    "source_name": { "type": "string", "description": "Source recorded on each chunk (default: 'string_input')" },
                    "tags": { "type": "array", "items": { "type": "string" }, "description": "Tags stored with every chunk" }
                },
                "required": ["text_content"]
            }
        },
        {
            "name": "query",
            "description": "Retrieve the stored chunks most similar to a query. Returns a JSON array with result_number, source, chunk_index, timestamp, distance (lower is closer), document and tags.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query_text": { "type": "string", "description": "The query" },
                    "num_results": { "type": "integer", "minimum": 0, "description": "Number of results to return (default: 5)" }
                },
                "required": ["query_text"]
            }
        },
        {
            "name": "reset_vector_store",
            "description": "Delete every ingested chunk. Irreversible.",
            "inputSchema": { "type": "object", "properties": {} }
        }
    ])
}

fn success_response(id: Value, result: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
    .to_string()
}

fn error_response(id: Value, code: i32, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
    .to_string()
}
