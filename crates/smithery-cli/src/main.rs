//! smithery CLI: browse the Smithery registry and drive its MCP servers.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use smithery_config::{CliOverrides, SmitheryConfig};
use smithery_core::{Client, ListServersOptions, Session};
use std::io;

#[derive(Parser)]
#[command(
    name = "smithery",
    version,
    about = "Query the Smithery registry and talk to hosted MCP servers"
)]
struct Cli {
    /// API key (overrides SMITHERY_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Enable debug logging and full wire dumps on stderr (not redacted)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registry servers
    Servers {
        /// Free-text search query
        #[arg(long, short)]
        query: Option<String>,

        /// 1-based page number
        #[arg(long)]
        page: Option<u32>,

        /// Results per page
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show one server's registry record
    Server {
        /// Qualified name, e.g. `@smithery/toolbox`
        qualified_name: String,
    },

    /// Connect to a server and list its tools
    Tools {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Connect to a server and invoke one tool
    Call {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Saved Smithery profile id
    #[arg(long, requires = "server", conflicts_with = "url")]
    profile: Option<String>,

    /// Registry server name used with --profile
    #[arg(long, requires = "profile")]
    server: Option<String>,

    /// MCP endpoint URL for a manual connection
    #[arg(long)]
    url: Option<String>,

    /// Inline server configuration (JSON) sent with --url
    #[arg(long, requires = "url")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = SmitheryConfig::load(CliOverrides {
        api_key: cli.api_key,
        verbose: cli.verbose,
    })
    .context("Failed to load configuration")?;

    let client = Client::new(config.api_key)
        .with_registry_url(config.registry_url)
        .with_server_host(config.server_host)
        .with_verbose(config.verbose);

    match cli.command {
        Command::Servers {
            query,
            page,
            page_size,
        } => {
            let mut options = ListServersOptions::new();
            if let Some(query) = query {
                options = options.query(query);
            }
            if let Some(page) = page {
                options = options.page(page);
            }
            if let Some(page_size) = page_size {
                options = options.page_size(page_size);
            }
            let page = client
                .list_servers(&options)
                .await
                .context("Failed to list servers")?;
            print_json(&page)
        }
        Command::Server { qualified_name } => {
            let detail = client
                .get_server(&qualified_name)
                .await
                .with_context(|| format!("Failed to fetch server {qualified_name}"))?;
            print_json(&detail)
        }
        Command::Tools { connection } => {
            let session = connect(&client, &connection).await?;
            let result = session.list_all_tools().await.context("Failed to list tools");
            finish(session, result).await.and_then(|tools| print_json(&tools))
        }
        Command::Call {
            tool,
            args,
            connection,
        } => {
            let arguments = parse_object(&args, "--args")?;
            let session = connect(&client, &connection).await?;
            let result = session
                .call_tool(&tool, arguments)
                .await
                .with_context(|| format!("Tool {tool} failed"));
            let result = finish(session, result).await?;
            print_json(&result)?;
            if result.is_error {
                bail!("Tool {tool} reported an error");
            }
            Ok(())
        }
    }
}

async fn connect(client: &Client, connection: &ConnectionArgs) -> Result<Session> {
    match (&connection.profile, &connection.server, &connection.url) {
        (Some(profile), Some(server), None) => client
            .connect_with_profile(profile, server)
            .await
            .with_context(|| format!("Failed to connect to {server}")),
        (None, None, Some(url)) => {
            let config = match &connection.config {
                Some(raw) => parse_object(raw, "--config")?,
                None => Map::new(),
            };
            client
                .connect_manually(url, &config)
                .await
                .context("Failed to connect to MCP server")
        }
        _ => bail!("pass either --profile and --server, or --url"),
    }
}

/// Close the session whatever happened, keeping the first error.
async fn finish<T>(session: Session, result: Result<T>) -> Result<T> {
    let closed = session.close().await;
    let value = result?;
    if let Err(e) = closed {
        tracing::warn!("Failed to close session: {e}");
    }
    Ok(value)
}

fn parse_object(raw: &str, flag: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).with_context(|| format!("{flag} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        other => bail!("{flag} must be a JSON object, got {other}"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_profile_connection_parses() {
        let cli = Cli::try_parse_from([
            "smithery", "tools", "--profile", "p1", "--server", "exa", "--api-key", "k",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        match cli.command {
            Command::Tools { connection } => {
                assert_eq!(connection.profile.as_deref(), Some("p1"));
                assert_eq!(connection.server.as_deref(), Some("exa"));
                assert!(connection.url.is_none());
            }
            _ => panic!("expected tools"),
        }
    }

    #[test]
    fn test_profile_and_url_conflict() {
        let err = Cli::try_parse_from([
            "smithery", "tools", "--profile", "p1", "--server", "exa", "--url", "http://x",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_config_requires_url() {
        assert!(Cli::try_parse_from(["smithery", "tools", "--config", "{}"]).is_err());
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object("[1,2]", "--args").is_err());
        assert!(parse_object("nope", "--args").is_err());
        let map = parse_object(r#"{"query":"rust"}"#, "--args").unwrap();
        assert_eq!(map["query"], "rust");
    }

    #[test]
    fn test_config_errors_keep_their_source() {
        let failed: Result<()> = Err(smithery_config::ConfigError::MissingKey {
            key: "api_key".into(),
        })
        .context("Failed to load configuration");
        let err = failed.unwrap_err();
        assert!(err.downcast_ref::<smithery_config::ConfigError>().is_some());
        assert_eq!(
            format!("{err:#}"),
            "Failed to load configuration: missing required setting: api_key"
        );
    }
}
