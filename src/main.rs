use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tvdb_client::{
    ApiError, ApiRequest, Connection, RemoteEndpoint, Status, TheTvDb, TokenStore, TokenStoreError,
};

/// Command line client for TheTVDB API
#[derive(Parser)]
#[command(name = "tvdb", about, version)]
struct Cli {
    /// API key (falls back to $TVDB_API_KEY, prompts if unset)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// User key for user scoped routes (falls back to $TVDB_USER_KEY)
    #[arg(long, global = true)]
    user_key: Option<String>,

    /// User name for user scoped routes (falls back to $TVDB_USER_NAME)
    #[arg(long, global = true)]
    user_name: Option<String>,

    /// Preferred response language, e.g. "de"
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Protocol of a proxy to send requests through
    #[arg(long, global = true)]
    protocol: Option<String>,

    /// Host of a proxy to send requests through
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port of a proxy to send requests through
    #[arg(long, global = true)]
    port: Option<u32>,

    /// Neither reuse nor persist the session token
    #[arg(long, global = true)]
    no_token_cache: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session token
    Login,
    /// Exchange the persisted token for a fresh one
    Refresh,
    /// Show a series
    Series { id: u64 },
    /// Show the response headers of a series
    Head { id: u64 },
    /// List the episodes of a series
    Episodes {
        id: u64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single episode
    Episode { id: u64 },
    /// Search series by name
    Search { name: String },
    /// List the supported languages
    Languages,
    /// List series updated in a time frame (Unix epoch seconds)
    Updated {
        #[arg(long)]
        from: i64,
        #[arg(long)]
        to: Option<i64>,
    },
    /// List the user's favorite series
    Favorites,
    /// Send a raw request, e.g. `raw GET /series/81189/actors`
    Raw {
        method: String,
        path: String,
        /// Request body for POST and PUT requests
        #[arg(long)]
        body: Option<String>,
    },
}

/// Errors reported by the command line interface
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("Failed to read input: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Failed to format output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("No API key given, use --api-key or set TVDB_API_KEY")]
    MissingApiKey,
}

/// Takes the command line value, falling back to an environment variable
fn arg_or_env(value: Option<String>, variable: &str) -> Option<String> {
    value
        .or_else(|| std::env::var(variable).ok())
        .filter(|v| !v.is_empty())
}

fn resolve_api_key(value: Option<String>) -> Result<String, CliError> {
    if let Some(api_key) = arg_or_env(value, "TVDB_API_KEY") {
        return Ok(api_key);
    }

    if !std::io::stdin().is_terminal() {
        return Err(CliError::MissingApiKey);
    }

    let api_key = dialoguer::Password::new()
        .with_prompt("TheTVDB API key")
        .interact()?;
    Ok(api_key)
}

fn build_connection(cli: &Cli) -> Result<Connection, CliError> {
    let api_key = resolve_api_key(cli.api_key.clone())?;

    let mut endpoint = RemoteEndpoint::builder();
    if let Some(protocol) = &cli.protocol {
        endpoint = endpoint.protocol(protocol);
    }
    if let Some(host) = &cli.host {
        endpoint = endpoint.host(host);
    }
    if let Some(port) = cli.port {
        endpoint = endpoint.port(port);
    }

    let mut builder = Connection::builder()
        .api_key(api_key)
        .endpoint(endpoint.build()?);

    let user_key = arg_or_env(cli.user_key.clone(), "TVDB_USER_KEY");
    let user_name = arg_or_env(cli.user_name.clone(), "TVDB_USER_NAME");
    if let (Some(user_key), Some(user_name)) = (user_key, user_name) {
        builder = builder.user_credentials(user_key, user_name);
    }

    if let Some(language) = &cli.language {
        builder = builder.language(language);
    }

    Ok(builder.build()?)
}

/// Installs a previously persisted token into the connection
fn restore_token(store: &TokenStore, connection: &Connection, keep_language: bool) {
    let user_name = connection.user_name();
    match store.load(&connection.api_key(), user_name.as_deref()) {
        Ok(Some((token, language))) => {
            if let Err(e) = connection.set_token(token) {
                tracing::warn!(error = %e, "Ignoring invalid persisted token");
                return;
            }
            if !keep_language {
                connection.set_language(language);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load persisted token"),
    }
}

/// Persists the connection's token if the session ended up authorized
fn persist_token(store: &TokenStore, connection: &Connection) {
    let user_name = connection.user_name();
    let api_key = connection.api_key();

    let result = match (connection.status(), connection.token()) {
        (Status::Authorized, Some(token)) => {
            store.store(&api_key, user_name.as_deref(), &token, &connection.language())
        }
        _ => store.remove(&api_key, user_name.as_deref()),
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to persist session token");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_command(tvdb: &TheTvDb, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login => {
            tvdb.login()?;
            println!("Logged in successfully.");
        }
        Command::Refresh => {
            tvdb.refresh_token()?;
            println!("Session token refreshed.");
        }
        Command::Series { id } => print_json(&tvdb.series(id)?)?,
        Command::Head { id } => print_json(&tvdb.series_head(id)?)?,
        Command::Episodes { id, page } => {
            let envelope = tvdb.series_episodes(id, page)?;
            print_json(&envelope.data)?;
            if let Some(next) = envelope.links.and_then(|links| links.next) {
                println!("More episodes available, use --page {}", next);
            }
        }
        Command::Episode { id } => print_json(&tvdb.episode(id)?)?,
        Command::Search { name } => print_json(&tvdb.search_series(&name)?)?,
        Command::Languages => print_json(&tvdb.languages()?)?,
        Command::Updated { from, to } => print_json(&tvdb.updated(from, to)?)?,
        Command::Favorites => print_json(&tvdb.user_favorites()?)?,
        Command::Raw { method, path, body } => {
            let request = ApiRequest::from_parts(&method, path, body)?;
            print_json(&tvdb.connection().send(request)?)?;
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let connection = build_connection(&cli)?;

    let store = if cli.no_token_cache {
        None
    } else {
        match TokenStore::open() {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(error = %e, "Token store unavailable, continuing without it");
                None
            }
        }
    };

    if let Some(store) = &store {
        restore_token(store, &connection, cli.language.is_some());
    }

    let tvdb = TheTvDb::new(connection);
    let result = run_command(&tvdb, cli.command);

    if let Some(store) = &store {
        persist_token(store, tvdb.connection());
    }

    result
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
