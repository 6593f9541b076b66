//! Upstream session management.
//!
//! Owns the single MCP-over-HTTP session against the Web Search Prime
//! endpoint: lazy initialization, search calls, and best-effort teardown.

use reqwest::Method;
use serde_json::{json, Value as JsonValue};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::{ProxyError, Result};
use crate::sse;

/// Fixed upstream endpoint. All requests go to this URL.
pub const ZAI_API_URL: &str = "https://api.z.ai/api/mcp/web_search_prime/mcp";

/// MCP protocol version spoken on both sides of the proxy.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Header carrying the upstream session identifier after initialization.
const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Requested size of result content snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentSize {
    /// Short snippets.
    Small,
    /// Default.
    #[default]
    Medium,
    /// Full-page extracts.
    Large,
}

impl ContentSize {
    /// Wire value expected by the upstream.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentSize::Small => "small",
            ContentSize::Medium => "medium",
            ContentSize::Large => "large",
        }
    }

    /// Parse the wire value. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "small" => Some(ContentSize::Small),
            "medium" => Some(ContentSize::Medium),
            "large" => Some(ContentSize::Large),
            _ => None,
        }
    }
}

/// Per-call search options, defaulted by the tool layer.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Snippet size.
    pub content_size: ContentSize,
    /// Two-letter search locale, e.g. "us".
    pub location: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            content_size: ContentSize::default(),
            location: "us".to_string(),
        }
    }
}

/// State of the one upstream session this process maintains.
///
/// `initialize()` is idempotent and invoked automatically by `search()`;
/// the session identifier, once assigned, is reused for every subsequent
/// request until `close()`.
pub struct UpstreamSession {
    client: reqwest::Client,
    api_key: String,
    session_id: Option<String>,
    initialized: bool,
}

impl UpstreamSession {
    /// Create an uninitialized session using the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            session_id: None,
            initialized: false,
        }
    }

    /// Whether the upstream handshake has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The session identifier, if one has been assigned.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Issue one HTTP request and return the raw body text.
    ///
    /// Applies the fixed header set (JSON content type, JSON + event-stream
    /// accept, bearer auth) plus the session header when a session exists.
    /// Non-2xx statuses become [`ProxyError::Http`].
    async fn request(&self, method: Method, body: Option<&JsonValue>) -> Result<String> {
        let mut req = self
            .client
            .request(method, ZAI_API_URL)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header("Authorization", format!("Bearer {}", self.api_key));

        if let Some(id) = &self.session_id {
            req = req.header(SESSION_HEADER, id);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProxyError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// Perform the upstream MCP handshake.
    ///
    /// No-op when already initialized. A response without any parsable SSE
    /// payload leaves the session uninitialized without raising; transport
    /// and HTTP failures propagate.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "roots": { "listChanged": true },
                    "sampling": {}
                },
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            }
        });

        let body = self.request(Method::POST, Some(&payload)).await?;

        match sse::first_json_message(&body) {
            Some(message) => {
                self.session_id = Some(session_id_from(&message));
                self.initialized = true;
                debug!(session_id = ?self.session_id, "upstream session initialized");
                self.send_initialized_notification().await;
            }
            None => {
                debug!("initialize response carried no parsable payload");
            }
        }
        Ok(())
    }

    /// Tell the upstream the handshake is complete. Fire-and-forget.
    async fn send_initialized_notification(&self) {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        });
        if let Err(e) = self.request(Method::POST, Some(&payload)).await {
            warn!("failed to send initialized notification: {e}");
        }
    }

    /// Run a search query against the upstream tool.
    ///
    /// Initializes the session first if needed. Returns the decoded result
    /// payload, expected to be an array of result objects in relevance order.
    pub async fn search(&mut self, query: &str, options: &SearchOptions) -> Result<JsonValue> {
        if !self.initialized {
            self.initialize().await?;
        }

        let payload = json!({
            "jsonrpc": "2.0",
            "id": timestamp_millis(),
            "method": "tools/call",
            "params": {
                "name": "webSearchPrime",
                "arguments": {
                    "search_query": query,
                    "content_size": options.content_size.as_str(),
                    "location": options.location,
                }
            }
        });

        let body = self.request(Method::POST, Some(&payload)).await?;

        let message = sse::first_json_message(&body).ok_or(ProxyError::ParseResponse)?;
        let text = sse::tool_result_text(&message).ok_or(ProxyError::ParseResponse)?;
        sse::decode_result_text(text)
    }

    /// Tear down the upstream session.
    ///
    /// Sends a DELETE carrying the session identifier when one exists; any
    /// failure is logged and swallowed. Local state is cleared either way.
    pub async fn close(&mut self) {
        if self.session_id.is_some() {
            if let Err(e) = self.request(Method::DELETE, None).await {
                warn!("failed to close upstream session: {e}");
            }
        }
        self.session_id = None;
        self.initialized = false;
    }
}

/// Derive the session identifier from the upstream's initialize message.
///
/// The upstream echoes the request id; a missing or non-scalar id falls back
/// to the literal `"1"`.
fn session_id_from(message: &JsonValue) -> String {
    match message.get("id") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => "1".to_string(),
    }
}

/// Milliseconds since the Unix epoch, used as a unique JSON-RPC request id.
fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
