//! # zai-mcp
//!
//! MCP (Model Context Protocol) stdio proxy for the Z.AI Web Search Prime API.
//!
//! This crate exposes a single `webSearchPrime` tool to MCP clients over
//! JSON-RPC 2.0 on stdin/stdout, and forwards each search to Z.AI's
//! MCP-over-HTTP endpoint. The upstream answers with SSE-framed JSON-RPC
//! bodies (payload on `data:` lines, sometimes doubly-encoded JSON), which
//! the session layer decodes into plain result lists.
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "zai-search": {
//!       "command": "/path/to/zai-mcp",
//!       "args": ["--api-key", "$ZAI_API_KEY"]
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, the server can be driven directly:
//!
//! ```no_run
//! use zai_mcp::{McpServer, OutputFormat, UpstreamSession};
//!
//! # async fn run() -> zai_mcp::Result<()> {
//! let session = UpstreamSession::new("your-api-key".to_string());
//! let mut server = McpServer::new(session, OutputFormat::Plain);
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod convert;
mod error;
mod format;
mod server;
mod session;
mod sse;
mod tools;

pub use error::{ProxyError, Result};
pub use format::{OutputFormat, SearchResult};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer, ToolCallResult};
pub use session::{ContentSize, SearchOptions, UpstreamSession};
pub use tools::{ToolDef, ToolRegistry};
