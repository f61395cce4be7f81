use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tabula::app::{self, Overrides};
use tabula::server;
use tabula_core::config::settings;
use tabula_core::search::CompoundTerm;
use tabula_core::{ConfigLookup, LayeredConfig, ReportError};

#[derive(Parser)]
#[command(name = "tabula", about = "tabula: record search with localized HTML table reports")]
struct Cli {
    /// Write debug logs to /tmp/tabula-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search and print the table markup followed by the auxiliary markup.
    Run {
        /// JSON fixture holding the records (defaults to `store_path`).
        #[arg(long)]
        store: Option<PathBuf>,
        /// Report profile TOML (defaults to `profile_path`, then the built-in).
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Search input as `term|lang`, e.g. `ACME|en`.
        compound: String,
    },
    /// Serve `GET /report?q=term|lang` over HTTP.
    Serve {
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Listen address (defaults to `server_bind`).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Inspect resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved value of one setting.
    Get { name: String },
    /// Print every known setting with its resolved value.
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let config = LayeredConfig::load()?;

    match cli.command {
        Command::Run { store, profile, compound } => {
            let facade = app::build_facade(&config, &Overrides { store_path: store, profile_path: profile })?;
            let compound = CompoundTerm::parse(&compound)?;
            let report = match facade.run_term(&compound.term, &compound.lang) {
                Ok(report) => report,
                Err(ReportError::NoMatchableCriteria { term }) => {
                    eprintln!("warning: no search criterion could use {term:?}");
                    facade.empty_report(&compound.lang)?
                }
                Err(err) => return Err(err.into()),
            };
            println!("{}", report.table_markup);
            println!("{}", report.auxiliary_markup);
        }
        Command::Serve { store, profile, bind } => {
            let facade = app::build_facade(&config, &Overrides { store_path: store, profile_path: profile })?;
            let bind = match bind {
                Some(bind) => bind,
                None => config.require(settings::SERVER_BIND)?,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(Arc::new(facade), &bind))?;
        }
        Command::Config { action: ConfigAction::Get { name } } => match config.get(&name) {
            Some(value) => println!("{value}"),
            None => anyhow::bail!("setting {name:?} has no value"),
        },
        Command::Config { action: ConfigAction::List } => {
            for name in config.names() {
                println!("{name} = {}", config.get(name).unwrap_or_default());
            }
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let filter = |fallback: &str| {
        tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };

    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/tabula-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(filter("debug"))
            .init();
        tracing::info!("tabula debug log started, tail -f /tmp/tabula-debug.log");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("warn"))
            .init();
    }
    Ok(())
}
