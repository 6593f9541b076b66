//! The `webSearchPrime` tool.
//!
//! Validates and defaults arguments, runs the search through the upstream
//! session, and shapes the decoded payload into a caller-facing result.

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{get_optional_bool, get_optional_string, get_optional_u64, get_string_arg};
use crate::error::{ProxyError, Result};
use crate::format::{render, results_from_value, OutputFormat};
use crate::server::ToolCallResult;
use crate::session::{ContentSize, SearchOptions, UpstreamSession};
use crate::tools::ToolDef;

/// Name the tool is registered under, matching the upstream's own tool name.
pub const TOOL_NAME: &str = "webSearchPrime";

/// Default number of results returned when `max_results` is omitted.
const DEFAULT_MAX_RESULTS: u64 = 5;

/// Get the search tool definition.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        TOOL_NAME,
        "Z.AI Web Search Prime - fast and accurate web search. Returns titles, \
         links, and content snippets for the query, in relevance order.",
        json!({
            "type": "object",
            "properties": {
                "search_query": {
                    "type": "string",
                    "description": "Search query"
                },
                "content_size": {
                    "type": "string",
                    "enum": ["small", "medium", "large"],
                    "description": "Content size of results (default: medium)",
                    "default": "medium"
                },
                "location": {
                    "type": "string",
                    "description": "Search location (default: us)",
                    "default": "us"
                },
                "max_results": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 20,
                    "description": "Maximum number of results to return (default: 5)",
                    "default": 5
                },
                "full_description": {
                    "type": "boolean",
                    "description": "Return full result content instead of 200-character snippets",
                    "default": false
                }
            },
            "required": ["search_query"]
        }),
    )]
}

/// Execute a search call.
///
/// Arguments are validated before any network activity; upstream failures
/// propagate to the dispatch layer where they are contained.
pub async fn execute(
    session: &mut UpstreamSession,
    format: OutputFormat,
    args: Map<String, JsonValue>,
) -> Result<ToolCallResult> {
    let query = get_string_arg(&args, "search_query")?;

    let content_size = match get_optional_string(&args, "content_size") {
        Some(s) => ContentSize::parse(&s).ok_or_else(|| ProxyError::InvalidArg {
            name: "content_size".to_string(),
            reason: format!("'{}' is not one of small, medium, large", s),
        })?,
        None => ContentSize::default(),
    };
    let location = get_optional_string(&args, "location").unwrap_or_else(|| "us".to_string());
    let max_results = get_optional_u64(&args, "max_results")
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, 20) as usize;
    let full_description = get_optional_bool(&args, "full_description").unwrap_or(false);

    let options = SearchOptions {
        content_size,
        location,
    };
    let payload = session.search(&query, &options).await?;

    Ok(shape_results(
        format,
        &query,
        payload,
        max_results,
        full_description,
    ))
}

/// Turn a decoded upstream payload into the final tool result.
///
/// Non-array payloads are coerced to zero results; the list is truncated to
/// `max_results` entries in upstream order. The `_meta` block reports the
/// untruncated total.
fn shape_results(
    format: OutputFormat,
    query: &str,
    payload: JsonValue,
    max_results: usize,
    full_description: bool,
) -> ToolCallResult {
    let results = results_from_value(payload);
    let total = results.len();
    let top = &results[..total.min(max_results)];

    let text = render(format, query, top, total, full_description);
    ToolCallResult::success(text).with_meta(json!({
        "totalResults": total,
        "query": query,
        "source": "zai-web-search-prime",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse;

    #[test]
    fn truncates_to_max_results_in_order() {
        let payload: JsonValue = (0..10)
            .map(|i| json!({"title": format!("t{i}"), "link": "https://x", "content": "c"}))
            .collect::<Vec<_>>()
            .into();

        let result = shape_results(OutputFormat::Plain, "q", payload, 3, false);
        let text = &result.content[0].text;
        assert!(text.contains("Found 10 results"));
        assert!(text.contains("1. t0"));
        assert!(text.contains("3. t2"));
        assert!(!text.contains("4. t3"));
        assert_eq!(result.meta.as_ref().unwrap()["totalResults"], 10);
    }

    #[test]
    fn non_array_payload_yields_zero_results() {
        let result = shape_results(OutputFormat::Plain, "q", json!({"error": "x"}), 5, false);
        assert_eq!(result.is_error, None);
        assert!(result.content[0].text.contains("Found 0 results"));
        assert_eq!(result.meta.as_ref().unwrap()["totalResults"], 0);
    }

    // Full pipeline from a canned upstream SSE body to rendered output.
    #[test]
    fn sse_body_to_rendered_listing() {
        let long = "Rust is a multi-paradigm systems programming language. ".repeat(8);
        let inner = json!([
            {"title": "Rust Programming Language", "link": "https://www.rust-lang.org", "content": long},
            {"title": "Rust (programming language) - Wikipedia", "link": "https://en.wikipedia.org/wiki/Rust", "content": "Article"},
        ]);
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": 1724000000000u64,
            "result": {"content": [{"type": "text", "text": inner.to_string()}]}
        });
        let body = format!("event: message\ndata: {}\n\n", envelope);

        let message = sse::first_json_message(&body).unwrap();
        let text = sse::tool_result_text(&message).unwrap();
        let payload = sse::decode_result_text(text).unwrap();

        let result = shape_results(
            OutputFormat::Plain,
            "rust programming language",
            payload,
            5,
            false,
        );
        let out = &result.content[0].text;
        assert!(out.contains("Found 2 results for: \"rust programming language\""));
        assert!(out.contains("1. Rust Programming Language"));
        assert!(out.contains("2. Rust (programming language) - Wikipedia"));

        // Snippet line is capped at 200 chars plus the ellipsis.
        let snippet_line = out
            .lines()
            .find(|l| l.trim_start().starts_with("Rust is a multi-paradigm"))
            .unwrap();
        assert!(snippet_line.trim_start().chars().count() <= 203);
        assert!(snippet_line.ends_with("..."));
    }
}
