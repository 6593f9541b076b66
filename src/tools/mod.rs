//! Tool registry and dispatch.
//!
//! The proxy exposes exactly one tool, `webSearchPrime`. Errors raised while
//! executing a tool are contained here: every failure becomes an `isError`
//! tool result with readable text, never a JSON-RPC error or a crash.

pub mod search;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::error;

use crate::error::ProxyError;
use crate::format::OutputFormat;
use crate::server::ToolCallResult;
use crate::session::UpstreamSession;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for the input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Registry of available MCP tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create the registry with the single search tool.
    pub fn new() -> Self {
        Self {
            tools: search::tools(),
        }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Dispatch a tool call to the appropriate handler.
    ///
    /// Failures from the handler are logged to the diagnostic stream and
    /// returned as error-flagged tool results.
    pub async fn dispatch(
        &self,
        session: &mut UpstreamSession,
        format: OutputFormat,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> ToolCallResult {
        let outcome = match name {
            search::TOOL_NAME => search::execute(session, format, args).await,
            _ => Err(ProxyError::UnknownTool(name.to_string())),
        };

        outcome.unwrap_or_else(|e| {
            error!("{name} tool error: {e}");
            ToolCallResult::error(format!("Search error: {e}"))
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_exposes_exactly_one_tool() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.tools().len(), 1);
        assert_eq!(registry.tools()[0].name, "webSearchPrime");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result() {
        let registry = ToolRegistry::new();
        let mut session = UpstreamSession::new("test-key".to_string());
        let result = registry
            .dispatch(&mut session, OutputFormat::Plain, "nope", Map::new())
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(result.content[0].text.contains("unknown tool: nope"));
    }

    #[tokio::test]
    async fn missing_query_becomes_error_result() {
        let registry = ToolRegistry::new();
        let mut session = UpstreamSession::new("test-key".to_string());
        let result = registry
            .dispatch(
                &mut session,
                OutputFormat::Plain,
                search::TOOL_NAME,
                Map::new(),
            )
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(result.content[0].text.contains("search_query"));
    }
}
