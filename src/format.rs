//! Result rendering.
//!
//! One configurable strategy covers both output shapes: a short plain-text
//! listing, and a tagged block with XML-escaped fields for callers that want
//! structure they can pattern-match on.

use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Character cap applied to snippets/descriptions unless the caller asks for
/// full text.
const SNIPPET_CHARS: usize = 200;

/// How tool output is rendered back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Numbered human-readable listing.
    #[default]
    Plain,
    /// `<search_results>` block with XML-escaped fields.
    Tagged,
}

/// One search result as returned by the upstream, fields all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Page URL.
    #[serde(default)]
    pub link: Option<String>,
    /// Content snippet or extract.
    #[serde(default)]
    pub content: Option<String>,
}

/// Coerce a decoded upstream payload into an ordered result list.
///
/// Anything that is not an array yields zero results; array elements that are
/// not result-shaped objects become empty results rather than failing the
/// whole call.
pub fn results_from_value(value: JsonValue) -> Vec<SearchResult> {
    match value {
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    }
}

/// Render results for the caller.
///
/// `results` is the already-truncated list; `total` is the upstream count
/// before truncation and is what the output reports as the match total.
pub fn render(
    format: OutputFormat,
    query: &str,
    results: &[SearchResult],
    total: usize,
    full_description: bool,
) -> String {
    match format {
        OutputFormat::Plain => render_plain(query, results, total, full_description),
        OutputFormat::Tagged => render_tagged(query, results, total, full_description),
    }
}

fn render_plain(
    query: &str,
    results: &[SearchResult],
    total: usize,
    full_description: bool,
) -> String {
    let mut out = format!("Found {} results for: \"{}\"\n\n", total, query);

    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n",
            i + 1,
            result.title.as_deref().unwrap_or("No title")
        ));
        out.push_str(&format!(
            "   {}\n",
            result.link.as_deref().unwrap_or("No link")
        ));
        if let Some(content) = &result.content {
            out.push_str(&format!("   {}\n", snippet(content, full_description)));
        }
        out.push('\n');
    }
    out
}

fn render_tagged(
    query: &str,
    results: &[SearchResult],
    total: usize,
    full_description: bool,
) -> String {
    let mut out = String::from("<search_results>\n");
    out.push_str(&format!("  <query>{}</query>\n", xml_escape(query)));
    out.push_str(&format!("  <total_results>{}</total_results>\n", total));

    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("  <result index=\"{}\">\n", i + 1));
        out.push_str(&format!(
            "    <title>{}</title>\n",
            xml_escape(result.title.as_deref().unwrap_or("No title"))
        ));
        out.push_str(&format!(
            "    <link>{}</link>\n",
            xml_escape(result.link.as_deref().unwrap_or("No link"))
        ));
        if let Some(content) = &result.content {
            out.push_str(&format!(
                "    <description>{}</description>\n",
                xml_escape(&snippet(content, full_description))
            ));
        }
        out.push_str("  </result>\n");
    }
    out.push_str("</search_results>\n");
    out
}

/// Cap text at the snippet length on a character boundary, with a trailing
/// ellipsis when anything was cut.
fn snippet(content: &str, full: bool) -> String {
    if full || content.chars().count() <= SNIPPET_CHARS {
        return content.to_string();
    }
    let mut s: String = content.chars().take(SNIPPET_CHARS).collect();
    s.push_str("...");
    s
}

/// Escape the five XML-significant characters, leaving everything else as-is.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
