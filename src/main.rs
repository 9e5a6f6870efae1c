use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use docsearch_mcp::client::{HttpSearchApi, SearchApi};
use docsearch_mcp::config::{get_config, load_config};
use docsearch_mcp::mcp::server::McpServer;
use docsearch_mcp::models::{MetadataFilter, SearchRequest, SearchVariant};
use docsearch_mcp::search::SearchDispatcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Docsearch MCP - expose a remote document-search backend as MCP tools
#[derive(Parser, Debug)]
#[command(name = "docsearch-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for a remote document search and indexing backend", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which backend search operation to use
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Variant {
    /// Precise snippet search (max 128 results)
    Snippets,
    /// Document search (max 2048 results)
    Documents,
    /// Page search (max 1024 results)
    Pages,
}

impl From<Variant> for SearchVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Snippets => SearchVariant::Snippets,
            Variant::Documents => SearchVariant::Documents,
            Variant::Pages => SearchVariant::Pages,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (for Claude Desktop and other MCP clients)
    Serve {
        /// Run in stdio mode (for MCP clients like Claude Desktop)
        #[arg(long, default_value_t = true)]
        stdio: bool,

        /// Run in HTTP/SSE mode (overrides --stdio)
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Search a collection from the terminal
    #[command(alias = "s")]
    Search {
        /// Collection to search
        collection: String,

        /// Search query
        query: String,

        /// Number of results (clamped per variant)
        #[arg(long, short, default_value_t = 5)]
        k: i64,

        /// Which search operation to use
        #[arg(long, value_enum, default_value_t = Variant::Snippets)]
        variant: Variant,

        /// Raw metadata filter query (JSON, backend query language)
        #[arg(long)]
        filter: Option<String>,

        /// Filter by author
        #[arg(long)]
        author: Option<String>,

        /// Filter by language
        #[arg(long)]
        language: Option<String>,

        /// Filter by tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Filter by timestamp after (ISO format)
        #[arg(long)]
        after: Option<String>,

        /// Filter by timestamp before (ISO format)
        #[arg(long)]
        before: Option<String>,
    },

    /// List all collections
    Collections,

    /// Show indexing status for a collection
    Status {
        /// Collection name
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docsearch_mcp={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => get_config(),
    };

    let api = HttpSearchApi::with_timeout(
        &config.api.base_url,
        config.api.key.clone(),
        Duration::from_secs(config.api.timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create backend client: {}", e))?;
    let api: Arc<dyn SearchApi> = Arc::new(api);

    match cli.command {
        Commands::Serve {
            stdio,
            http,
            port,
            host,
        } => {
            let server = McpServer::new(api)?;

            // Use HTTP mode if --http flag is provided, otherwise use --stdio
            let use_http = http || !stdio;

            if use_http {
                let addr = format!("{}:{}", host, port);
                tracing::info!("Running MCP server in HTTP/SSE mode on {}", addr);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                tracing::info!("Running MCP server in stdio mode");
                server.run().await?;
            }
        }

        Commands::Search {
            collection,
            query,
            k,
            variant,
            filter,
            author,
            language,
            tags,
            after,
            before,
        } => {
            let mut request = SearchRequest::new(collection, query, variant.into()).k(k);

            if let Some(raw) = filter {
                let parsed: serde_json::Value = serde_json::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("Invalid --filter JSON: {}", e))?;
                request = request.filter(parsed);
            } else {
                let mut criteria = MetadataFilter::new().tags(tags);
                if let Some(author) = author {
                    criteria = criteria.author(author);
                }
                if let Some(language) = language {
                    criteria = criteria.language(language);
                }
                if let Some(after) = after {
                    criteria = criteria.timestamp_after(after);
                }
                if let Some(before) = before {
                    criteria = criteria.timestamp_before(before);
                }
                if let Some(expr) = criteria.compile() {
                    request = request.filter_expression(&expr);
                }
            }

            let dispatcher = SearchDispatcher::new(api);
            println!("{}", dispatcher.dispatch(&request).await.into_text());
        }

        Commands::Collections => {
            let list = api
                .list_collections()
                .await
                .map_err(|e| anyhow::anyhow!("Error listing collections: {}", e))?;
            println!("{}", serde_json::to_string_pretty(&list.collection_names)?);
        }

        Commands::Status { collection } => {
            let status = api
                .collection_status(&collection)
                .await
                .map_err(|e| anyhow::anyhow!("Error getting status: {}", e))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["docsearch-mcp", "serve"]);
        match &cli.command {
            Commands::Serve {
                stdio, port, host, ..
            } => {
                assert!(*stdio);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_http_mode() {
        let cli = Cli::parse_from(["docsearch-mcp", "serve", "--http", "--port", "8080"]);
        match &cli.command {
            Commands::Serve { http, port, .. } => {
                assert!(*http);
                assert_eq!(*port, 8080);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_search_defaults() {
        let cli = Cli::parse_from(["docsearch-mcp", "search", "docs", "history of jazz"]);
        match &cli.command {
            Commands::Search {
                collection,
                query,
                k,
                variant,
                ..
            } => {
                assert_eq!(collection, "docs");
                assert_eq!(query, "history of jazz");
                assert_eq!(*k, 5);
                assert_eq!(*variant, Variant::Snippets);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_with_filters() {
        let cli = Cli::parse_from([
            "docsearch-mcp",
            "search",
            "docs",
            "jazz",
            "--variant",
            "documents",
            "--author",
            "A",
            "--tag",
            "ai",
            "--tag",
            "tech",
        ]);
        match &cli.command {
            Commands::Search {
                variant,
                author,
                tags,
                ..
            } => {
                assert_eq!(*variant, Variant::Documents);
                assert_eq!(author.as_deref(), Some("A"));
                assert_eq!(tags, &["ai", "tech"]);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_alias() {
        let cli = Cli::parse_from(["docsearch-mcp", "s", "docs", "jazz"]);
        assert!(matches!(cli.command, Commands::Search { .. }));
    }
}
