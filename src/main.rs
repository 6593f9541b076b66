//! zai-mcp executable entry point.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use zai_mcp::{McpServer, OutputFormat, UpstreamSession};

/// MCP stdio proxy for the Z.AI Web Search Prime API.
#[derive(Parser)]
#[command(name = "zai-mcp", version, about)]
struct Cli {
    /// Z.AI API key. Falls back to the ZAI_API_KEY environment variable.
    #[arg(long, env = "ZAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// How search results are rendered back to the caller.
    #[arg(long, value_enum, default_value = "plain")]
    format: OutputFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Missing --api-key / ZAI_API_KEY exits here with usage on stderr.
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("starting Z.AI MCP proxy");

    let session = UpstreamSession::new(cli.api_key);
    let mut server = McpServer::new(session, cli.format);

    if let Err(e) = server.run().await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
