//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use crate::adapters::csv_adapter::write_history;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::static_quote_adapter::StaticQuoteAdapter;
use crate::adapters::yahoo_quote_adapter::YahooQuoteAdapter;
use crate::domain::error::TraderError;
use crate::domain::money::usd;
use crate::domain::order::normalize_symbol;
use crate::domain::settings::{quote_provider, QuoteProviderKind};
use crate::domain::trading::require_quote;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

#[derive(Parser, Debug)]
#[command(name = "simtrader", about = "Paper-trading web application")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the database tables
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Look up a stock quote
    Quote {
        #[arg(short, long)]
        config: PathBuf,
        symbol: String,
    },
    /// Write a user's transaction history as CSV
    ExportHistory {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        username: String,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    crate::log::init_logging(cli.verbose);

    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::InitDb { config } => run_init_db(&config),
        Command::Quote { config, symbol } => run_quote(&config, &symbol),
        Command::ExportHistory {
            config,
            username,
            output,
        } => run_export_history(&config, &username, output.as_ref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, TraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| TraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Pick the quote adapter named by `[quotes] provider`.
pub fn build_quote_port(config: &dyn ConfigPort) -> Result<Arc<dyn QuotePort>, TraderError> {
    let port: Arc<dyn QuotePort> = match quote_provider(config)? {
        QuoteProviderKind::Yahoo => Arc::new(YahooQuoteAdapter::from_config(config)?),
        QuoteProviderKind::Static => Arc::new(StaticQuoteAdapter::from_config(config)?),
    };
    Ok(port)
}

fn open_ledger(config: &dyn ConfigPort) -> Result<SqliteAdapter, TraderError> {
    let ledger = SqliteAdapter::from_config(config)?;
    ledger.initialize_schema()?;
    Ok(ledger)
}

fn runtime() -> Result<tokio::runtime::Runtime, TraderError> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn run_init_db(config_path: &PathBuf) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    open_ledger(&config)?;
    info!("schema ready");
    Ok(())
}

fn run_quote(config_path: &PathBuf, symbol: &str) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let quotes = build_quote_port(&config)?;
    let symbol = normalize_symbol(symbol)?;

    let quote = runtime()?.block_on(require_quote(&*quotes, &symbol))?;
    println!("{} ({}): {}", quote.name, quote.symbol, usd(quote.price));
    Ok(())
}

fn run_export_history(
    config_path: &PathBuf,
    username: &str,
    output: Option<&PathBuf>,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let ledger = open_ledger(&config)?;

    let user = ledger
        .find_user_by_name(username)?
        .ok_or_else(|| TraderError::validation(format!("no such user {username}")))?;
    let history = ledger.history(user.id)?;

    match output {
        Some(path) => write_history(File::create(path)?, &history)?,
        None => write_history(io::stdout().lock(), &history)?,
    }
    info!(rows = history.len(), %username, "exported history");
    Ok(())
}

#[cfg(feature = "web")]
fn run_serve(config_path: &PathBuf) -> Result<(), TraderError> {
    use crate::adapters::web::{build_router, AppState};
    use crate::domain::settings::{validate_server_config, DEFAULT_LISTEN};
    use std::net::SocketAddr;

    info!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_server_config(&config)?;

    let ledger = Arc::new(open_ledger(&config)?);
    let quotes = build_quote_port(&config)?;

    let listen = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    let addr: SocketAddr = listen.parse().map_err(|_| TraderError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: format!("{listen:?} is not a socket address"),
    })?;

    let state = AppState::new(ledger, quotes, Arc::new(config))?;

    runtime()?.block_on(async {
        let router = build_router(state).await?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Starting web server on {}", addr);
        axum::serve(listener, router).await?;
        Ok(())
    })
}

#[cfg(not(feature = "web"))]
fn run_serve(config_path: &PathBuf) -> Result<(), TraderError> {
    let _ = config_path;
    Err(TraderError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: "web feature is required for serve".into(),
    })
}
