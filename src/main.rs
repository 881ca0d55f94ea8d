use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use harvard_library_mcp::config::{
    default_config_path, find_config_file, load_config, Config, CONFIG_FILE_NAME, ENV_PREFIX,
};
use harvard_library_mcp::mcp::McpServer;
use harvard_library_mcp::models::{ResponseFormat, SortOrder};
use harvard_library_mcp::tools::{collections_envelope, parse_mods_envelope, validate_limit};
use harvard_library_mcp::utils::{extract_isbn, truncate_text};
use harvard_library_mcp::{CatalogClient, CatalogRecord, CatalogTools, SearchQuery};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Harvard Library MCP - Search the Harvard Library catalog from MCP clients and the shell
#[derive(Parser, Debug)]
#[command(name = "harvard-library-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the Harvard Library bibliographic catalog", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Sort order
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Asc,
            Order::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (stdio by default)
    Serve {
        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Host to bind in HTTP mode (default: server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind in HTTP mode (default: server.port)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Run the HTTP/REST mirror
    Rest {
        /// Host to bind (default: server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (default: server.port)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Search the catalog
    #[command(alias = "s")]
    Search {
        /// Free-text query
        query: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        subject: Option<String>,

        /// Collection set name (see `collections`)
        #[arg(long)]
        collection: Option<String>,

        #[arg(long)]
        origin_place: Option<String>,

        #[arg(long)]
        publication_place: Option<String>,

        #[arg(long)]
        language: Option<String>,

        /// Resource type (e.g. "text", "still image")
        #[arg(long)]
        format_type: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Maximum number of results (1-100)
        #[arg(long, short, default_value_t = 20)]
        limit: usize,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Sort field
        #[arg(long)]
        sort_by: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t = Order::Asc)]
        order: Order,

        /// Request XML from the upstream instead of JSON
        #[arg(long)]
        xml: bool,
    },

    /// Show a single record
    #[command(alias = "r")]
    Record {
        /// Record identifier
        id: String,

        /// Request XML from the upstream instead of JSON
        #[arg(long)]
        xml: bool,
    },

    /// List known collections
    Collections,

    /// Parse a MODS XML file
    ParseMods {
        /// Path to the MODS XML document
        file: PathBuf,
    },

    /// Write a configuration file with the default settings
    InitConfig {
        /// Destination (default: the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Harvard Library MCP - Environment Variables");
    println!();
    println!("API:");
    println!("  {}_API__BASE_URL                    Catalog API base URL (default: https://api.lib.harvard.edu/v2)", ENV_PREFIX);
    println!("  {}_API__TIMEOUT_SECONDS             Request timeout in seconds (default: 30)", ENV_PREFIX);
    println!("  {}_API__USER_AGENT                  User-Agent header sent upstream", ENV_PREFIX);
    println!();
    println!("Rate Limiting:");
    println!("  {}_RATE_LIMITS__REQUESTS_PER_SECOND Sustained request rate (default: 10)", ENV_PREFIX);
    println!("  {}_RATE_LIMITS__BURST_SIZE          Requests allowed in a burst (default: 20)", ENV_PREFIX);
    println!();
    println!("Server:");
    println!("  {}_SERVER__HOST                     Bind address for HTTP modes (default: 127.0.0.1)", ENV_PREFIX);
    println!("  {}_SERVER__PORT                     Bind port for HTTP modes (default: 8000)", ENV_PREFIX);
    println!();
    println!("Logging:");
    println!("  {}_LOGGING__LEVEL                   Log level (default: info)", ENV_PREFIX);
    println!("  {}_LOGGING__FORMAT                  'text' or 'json' (default: text)", ENV_PREFIX);
    println!("  RUST_LOG                                   Overrides the log filter entirely");
    println!();
    println!("Config files (first found wins):");
    println!("  ./{}", CONFIG_FILE_NAME);
    if let Some(path) = default_config_path() {
        println!("  {}", path.display());
    }
    std::process::exit(0);
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("harvard_library_mcp={}", level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the MCP stdio channel
    if config.logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn bind_address(config: &Config, host: Option<String>, port: Option<u16>) -> String {
    format!(
        "{}:{}",
        host.unwrap_or_else(|| config.server.host.clone()),
        port.unwrap_or(config.server.port)
    )
}

fn response_format(xml: bool) -> ResponseFormat {
    if xml {
        ResponseFormat::Xml
    } else {
        ResponseFormat::Json
    }
}

/// Close the client once every other holder is gone
fn release_client(client: Arc<CatalogClient>) {
    match Arc::try_unwrap(client) {
        Ok(client) => client.close(),
        Err(_) => tracing::debug!("Catalog client still shared at shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
    }

    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref())?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let Some(command) = cli.command else {
        eprintln!("No command given. Run with --help for usage.");
        return Ok(());
    };

    if let Commands::InitConfig { path, force } = &command {
        let path = match path.clone().or_else(default_config_path) {
            Some(path) => path,
            None => anyhow::bail!("Could not determine a config directory; pass a path"),
        };
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        Config::default().save(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let client = Arc::new(CatalogClient::new(&config)?);
    let output = cli.output.resolve();

    match command {
        Commands::Serve { http, host, port } => {
            tracing::info!(
                "Starting Harvard Library MCP server v{} (API {}, {} req/s)",
                env!("CARGO_PKG_VERSION"),
                config.api.base_url,
                config.rate_limits.requests_per_second
            );
            let server = McpServer::new(CatalogTools::new(client.clone()))?;

            if http {
                let addr = bind_address(&config, host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                tokio::select! {
                    result = handle => {
                        result.map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Server stopped by user");
                    }
                }
                drop(server);
            } else {
                server.run().await?;
            }
        }

        Commands::Rest { host, port } => {
            let addr: SocketAddr = bind_address(&config, host, port).parse()?;
            harvard_library_mcp::rest::serve(CatalogTools::new(client.clone()), addr).await?;
        }

        Commands::Search {
            query,
            title,
            author,
            subject,
            collection,
            origin_place,
            publication_place,
            language,
            format_type,
            start_date,
            end_date,
            limit,
            offset,
            sort_by,
            order,
            xml,
        } => {
            validate_limit(limit).map_err(anyhow::Error::msg)?;

            let search_query = SearchQuery {
                query,
                title,
                author,
                subject,
                collection,
                origin_place,
                publication_place,
                language,
                format_type,
                start_date,
                end_date,
                limit,
                offset,
                sort_by,
                sort_order: order.into(),
                response_format: response_format(xml),
            };

            let result = client.search(&search_query).await?;
            output_records(&result.records, output)?;
            if output != OutputFormat::Json {
                eprintln!(
                    "Showing {}-{} of {} records{}",
                    offset + usize::from(!result.is_empty()),
                    offset + result.len(),
                    result.total_count,
                    if result.has_more { " (more available)" } else { "" }
                );
            }
        }

        Commands::Record { id, xml } => {
            match client.get_record_by_id(&id, response_format(xml)).await? {
                Some(record) => output_record(&record, output)?,
                None => anyhow::bail!("Record {} not found", id),
            }
        }

        Commands::Collections => {
            let envelope = collections_envelope();
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
                _ => output_collections(output),
            }
        }

        Commands::ParseMods { file } => {
            let xml = std::fs::read_to_string(&file)?;
            let envelope = parse_mods_envelope(&xml);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }

        Commands::InitConfig { .. } => {}
    }

    release_client(client);
    Ok(())
}

fn output_records(records: &[CatalogRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Auto => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Plain => {
            for record in records {
                println!("{} - {}", record.display_title(), record.authors_string());
                println!("  ID: {}", record.id);
                if let Some(ref date) = record.publication_date {
                    println!("  Date: {}", date);
                }
                if let Some(isbn) = extract_isbn(&record.identifiers) {
                    println!("  ISBN: {}", isbn);
                }
                if let Some(ref permalink) = record.permalink {
                    println!("  Permalink: {}", permalink);
                }
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Date", "ID"]);

            for record in records {
                table.add_row(vec![
                    Cell::new(truncate_text(record.display_title(), 50, "..."))
                        .add_attribute(Attribute::Bold),
                    Cell::new(truncate_text(&record.authors_string(), 30, "...")),
                    Cell::new(record.publication_date.as_deref().unwrap_or_default()),
                    Cell::new(&record.id),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_record(record: &CatalogRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Auto => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        OutputFormat::Plain | OutputFormat::Table => {
            let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
            println!("{}", record.display_title());
            println!("  ID:         {}", record.id);
            println!("  Authors:    {}", record.authors_string());
            println!("  Date:       {}", optional(&record.publication_date));
            println!("  Publisher:  {}", optional(&record.publisher));
            println!("  Language:   {}", optional(&record.language));
            println!("  Format:     {}", optional(&record.format_type));
            if !record.subjects.is_empty() {
                println!("  Subjects:   {}", record.subjects.join("; "));
            }
            for (scheme, value) in &record.identifiers {
                println!("  {:<11} {}", format!("{}:", scheme), value);
            }
            if let Some(ref permalink) = record.permalink {
                println!("  Permalink:  {}", permalink);
            }
            println!("  Digital:    {}", if record.digital_content { "yes" } else { "no" });
            if let Some(ref description) = record.description {
                println!();
                println!("{}", truncate_text(description, 500, "..."));
            }
        }
    }
    Ok(())
}

fn output_collections(format: OutputFormat) {
    use harvard_library_mcp::tools::KNOWN_COLLECTIONS;

    if format == OutputFormat::Table {
        use comfy_table::{Cell, Table};
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Set name", "Name", "Description"]);
        for collection in KNOWN_COLLECTIONS {
            table.add_row(vec![
                Cell::new(collection.id),
                Cell::new(collection.name),
                Cell::new(collection.description),
            ]);
        }
        println!("{table}");
    } else {
        for collection in KNOWN_COLLECTIONS {
            println!("{} - {}", collection.id, collection.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["harvard-library-mcp"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["harvard-library-mcp", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["harvard-library-mcp", "--quiet"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["harvard-library-mcp", "-o", "json", "collections"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.output.resolve(), OutputFormat::Json);
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::parse_from(["harvard-library-mcp", "serve"]);
        match cli.command {
            Some(Commands::Serve { http, host, port }) => {
                assert!(!http);
                assert!(host.is_none());
                assert!(port.is_none());
            }
            _ => panic!("Expected Serve command"),
        }

        let cli = Cli::parse_from([
            "harvard-library-mcp",
            "serve",
            "--http",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ]);
        match cli.command {
            Some(Commands::Serve { http, host, port }) => {
                assert!(http);
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_search_command() {
        let cli = Cli::parse_from([
            "harvard-library-mcp",
            "search",
            "whaling",
            "--author",
            "Melville",
            "--limit",
            "5",
            "--order",
            "desc",
            "--xml",
        ]);
        match cli.command {
            Some(Commands::Search {
                query,
                author,
                limit,
                order,
                xml,
                ..
            }) => {
                assert_eq!(query.as_deref(), Some("whaling"));
                assert_eq!(author.as_deref(), Some("Melville"));
                assert_eq!(limit, 5);
                assert_eq!(SortOrder::from(order), SortOrder::Desc);
                assert!(xml);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_bind_address_defaults_to_config() {
        let config = Config::default();
        assert_eq!(bind_address(&config, None, None), "127.0.0.1:8000");
        assert_eq!(
            bind_address(&config, Some("0.0.0.0".to_string()), Some(9000)),
            "0.0.0.0:9000"
        );
    }

    #[test]
    fn test_init_config_command() {
        let cli = Cli::parse_from(["harvard-library-mcp", "init-config", "/tmp/h.toml", "--force"]);
        match cli.command {
            Some(Commands::InitConfig { path, force }) => {
                assert_eq!(path, Some(PathBuf::from("/tmp/h.toml")));
                assert!(force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }
}
