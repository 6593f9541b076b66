//! JSON-RPC 2.0 server over stdin/stdout.
//!
//! Reads line-delimited requests, dispatches the MCP methods (`initialize`,
//! `tools/list`, `tools/call`, `ping`), and writes responses to stdout.
//! Diagnostics go to stderr via tracing so the output stream stays clean.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::error::Result;
use crate::format::OutputFormat;
use crate::session::{UpstreamSession, PROTOCOL_VERSION};
use crate::tools::{ToolDef, ToolRegistry};

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol marker, expected "2.0".
    pub jsonrpc: String,
    /// Request id; absent for notifications.
    pub id: Option<JsonValue>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol marker, always "2.0".
    pub jsonrpc: String,
    /// Echoed request id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    /// Successful result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Protocol-level error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// JSON-RPC error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

impl JsonRpcResponse {
    /// Build a success response.
    pub fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn error(id: Option<JsonValue>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

/// Result of the MCP `initialize` method.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: String,
    capabilities: ServerCapabilities,
    server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
struct ToolsCapability {
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<ToolDef>,
}

/// Parameters of a `tools/call` request.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, JsonValue>>,
}

/// One text block in a tool result.
#[derive(Debug, Serialize)]
pub struct TextContent {
    /// Always "text".
    #[serde(rename = "type")]
    pub content_type: String,
    /// The rendered text.
    pub text: String,
}

/// Result of a tool invocation.
///
/// Failures are expressed in-band: `is_error` is set and the content carries
/// the message, so callers always receive a well-formed result.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// Content blocks.
    pub content: Vec<TextContent>,
    /// Set when the invocation failed.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// Side-channel metadata about the result.
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<JsonValue>,
}

impl ToolCallResult {
    /// A successful text result.
    pub fn success(text: String) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: None,
            meta: None,
        }
    }

    /// An error-flagged text result.
    pub fn error(text: String) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: Some(true),
            meta: None,
        }
    }

    /// Attach a `_meta` block.
    pub fn with_meta(mut self, meta: JsonValue) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// The stdio MCP server.
///
/// Owns the upstream session; requests are handled one at a time in arrival
/// order, so session state needs no locking.
pub struct McpServer {
    session: UpstreamSession,
    registry: ToolRegistry,
    format: OutputFormat,
}

impl McpServer {
    /// Create a server around an upstream session.
    pub fn new(session: UpstreamSession, format: OutputFormat) -> Self {
        Self {
            session,
            registry: ToolRegistry::new(),
            format,
        }
    }

    /// Run the server until stdin closes or a shutdown signal arrives.
    ///
    /// The upstream session is torn down before returning, on both paths.
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = tokio::io::stdout();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                        Ok(request) => self.handle_request(request).await,
                        Err(e) => Some(JsonRpcResponse::error(
                            None,
                            PARSE_ERROR,
                            format!("Parse error: {}", e),
                        )),
                    };

                    if let Some(response) = response {
                        let payload = serde_json::to_string(&response)?;
                        stdout.write_all(payload.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                    }
                }
            }
        }

        self.session.close().await;
        Ok(())
    }

    /// Handle one request. Notifications get no response.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // JSON-RPC: a request without an id is a notification and must
        // never be answered, whatever the method.
        if request.id.is_none() {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<JsonValue>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    fn handle_tools_list(&self, id: Option<JsonValue>) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.registry.tools().to_vec(),
        };
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    async fn handle_tools_call(
        &mut self,
        id: Option<JsonValue>,
        params: Option<JsonValue>,
    ) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params".to_string());
        };

        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
        };

        let args = call.arguments.unwrap_or_default();
        let result = self
            .registry
            .dispatch(&mut self.session, self.format, &call.name, args)
            .await;

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }
}

/// Resolve when the process should shut down.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::warn;

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("failed to install SIGTERM handler: {e}");
            let _ = ctrl_c.await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(
            UpstreamSession::new("test-key".to_string()),
            OutputFormat::Plain,
        )
    }

    fn request(id: Option<JsonValue>, method: &str, params: Option<JsonValue>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let mut srv = server();
        let response = srv
            .handle_request(request(Some(json!(1)), "initialize", None))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn tools_list_has_the_single_search_tool() {
        let mut srv = server();
        let response = srv
            .handle_request(request(Some(json!(2)), "tools/list", None))
            .await
            .unwrap();
        let result = response.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "webSearchPrime");

        let schema = &tools[0]["inputSchema"];
        assert_eq!(schema["required"], json!(["search_query"]));
        assert_eq!(schema["properties"]["max_results"]["minimum"], 1);
        assert_eq!(schema["properties"]["max_results"]["maximum"], 20);
        assert_eq!(
            schema["properties"]["content_size"]["enum"],
            json!(["small", "medium", "large"])
        );
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let mut srv = server();
        let response = srv
            .handle_request(request(None, "notifications/initialized", None))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn any_id_less_request_is_a_notification() {
        let mut srv = server();
        // Even a known method gets no response without an id.
        assert!(srv
            .handle_request(request(None, "tools/list", None))
            .await
            .is_none());
        assert!(srv
            .handle_request(request(None, "no/such/method", None))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let mut srv = server();
        let response = srv
            .handle_request(request(Some(json!(3)), "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid() {
        let mut srv = server();
        let response = srv
            .handle_request(request(Some(json!(4)), "tools/call", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn failed_tool_call_is_still_a_success_response() {
        let mut srv = server();
        let params = json!({"name": "webSearchPrime", "arguments": {}});
        let response = srv
            .handle_request(request(Some(json!(5)), "tools/call", Some(params)))
            .await
            .unwrap();
        // Tool failure is contained in the result, not a JSON-RPC error.
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("search_query"));
    }
}
