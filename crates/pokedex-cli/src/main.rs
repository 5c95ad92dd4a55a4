//! Pokédex CLI
//!
//! - `serve`: the read-only HTTP query service
//! - `browse`: the interactive terminal client (or scripted with `--cmd`)
//! - `search` / `show` / `chain` / `random`: one-shot lookups
//! - `check`: dataset lint

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use pokedex_catalog::lint::{has_errors, lint};
use pokedex_catalog::{load_path, Catalog, Severity};
use pokedex_client::render::{card_line, render_detail};
use pokedex_client::view::{cards, detail_view};
use pokedex_client::{DetailTab, HttpQueryService, LocalQueryService, QueryService};

mod browse;
mod chain;
mod server;

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(author, version, about = "Pokédex: creature catalog service and terminal browser")]
struct Cli {
    /// Debug-level logging (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dataset over HTTP (`/collection`, `/collection/{id}`, ...).
    Serve(ServeArgs),

    /// Browse interactively: search, open records, walk evolution chains.
    Browse {
        #[command(flatten)]
        source: SourceArgs,
        /// Run a non-interactive script (one command per line). Use `-` to read from stdin.
        #[arg(long)]
        script: Option<PathBuf>,
        /// Run one browse command (may be repeated).
        #[arg(long, value_name = "CMD")]
        cmd: Vec<String>,
        /// Continue executing script/commands after a failure (default is fail-fast).
        #[arg(long)]
        continue_on_error: bool,
        /// Do not echo commands while running a script / `--cmd`.
        #[arg(long)]
        quiet: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },

    /// Search by name substring or exact id.
    Search {
        query: String,
        #[command(flatten)]
        source: SourceArgs,
        /// Print the matching records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one record's detail view.
    Show {
        id: u32,
        #[command(flatten)]
        source: SourceArgs,
        /// `general` or `more-info`.
        #[arg(long, default_value = "general")]
        tab: String,
        /// Print the record as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// Print the evolution chain a record belongs to.
    Chain {
        id: u32,
        #[command(flatten)]
        source: SourceArgs,
        /// `text`, `dot` or `json`.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Pick random records.
    Random {
        #[arg(long, default_value_t = 3)]
        count: usize,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Lint a dataset: dangling or one-sided evolution links and cycles.
    ///
    /// Exits non-zero when any error-level finding is reported.
    Check {
        #[command(flatten)]
        data: DataArgs,
        /// Print findings as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Dataset: a JSON array file, a CSV file, or a directory with `pokemon.csv`.
    #[arg(long, env = "POKEDEX_DATA")]
    data: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Listen address (use `127.0.0.1:0` to auto-pick a free port).
    #[arg(long, default_value = "127.0.0.1:5000")]
    listen: std::net::SocketAddr,

    /// If set, write a small JSON file once the server is listening.
    ///
    /// Useful for scripts/tests to learn the chosen port when `--listen ...:0`.
    #[arg(long)]
    ready_file: Option<PathBuf>,
}

/// Where records come from: a running service or a local dataset.
/// `--server` wins when both are given.
#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Query service base URL, e.g. `http://127.0.0.1:5000`.
    #[arg(long, env = "POKEDEX_SERVER")]
    server: Option<String>,

    /// Local dataset path (used when no `--server` is given).
    #[arg(long, env = "POKEDEX_DATA")]
    data: Option<PathBuf>,

    /// HTTP timeout in seconds. `0` disables the timeout.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl SourceArgs {
    fn service(&self) -> Result<Box<dyn QueryService>> {
        if let Some(url) = &self.server {
            let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
            return Ok(Box::new(HttpQueryService::new(url, timeout)?));
        }
        if let Some(path) = &self.data {
            let loaded = load_path(path)?;
            return Ok(Box::new(LocalQueryService::new(Arc::new(loaded.catalog))));
        }
        Err(anyhow!(
            "no data source: pass `--server <url>` or `--data <path>` (or set POKEDEX_SERVER / POKEDEX_DATA)"
        ))
    }

    /// The whole catalog, fetched once.
    fn catalog(&self) -> Result<Catalog> {
        let records = self.service()?.list_all()?;
        Ok(Catalog::from_records(records)?)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve(args) => server::cmd_serve(args)?,
        Commands::Browse {
            source,
            script,
            cmd,
            continue_on_error,
            quiet,
            plain,
        } => {
            if plain {
                colored::control::set_override(false);
            }
            let state = browse::BrowseState::new(source.service()?)?;
            if script.is_some() || !cmd.is_empty() {
                browse::cmd_browse_script(state, script.as_ref(), &cmd, continue_on_error, quiet)?;
            } else {
                browse::cmd_browse(state)?;
            }
        }
        Commands::Search {
            query,
            source,
            json,
        } => cmd_search(&source, &query, json)?,
        Commands::Show {
            id,
            source,
            tab,
            json,
        } => cmd_show(&source, id, &tab, json)?,
        Commands::Chain { id, source, format } => {
            let format = chain::ChainFormat::parse(&format)?;
            let catalog = source.catalog()?;
            println!("{}", chain::render_chain(&catalog, id, format)?);
        }
        Commands::Random { count, source } => {
            let records = source.service()?.random(count)?;
            for card in cards(&records) {
                println!("{}", card_line(&card));
            }
        }
        Commands::Check { data, json } => cmd_check(&data, json)?,
    }

    Ok(())
}

fn cmd_search(source: &SourceArgs, query: &str, json: bool) -> Result<()> {
    let records = source.service()?.search(query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No matches for \"{}\".", query.trim());
    }
    for card in cards(&records) {
        println!("{}", card_line(&card));
    }
    Ok(())
}

fn cmd_show(source: &SourceArgs, id: u32, tab: &str, json: bool) -> Result<()> {
    let tab = DetailTab::parse(tab)
        .ok_or_else(|| anyhow!("unknown tab `{tab}` (expected general|more-info)"))?;
    let catalog = source.catalog()?;
    let record = catalog.get_by_id(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("{}", render_detail(&detail_view(&catalog, record, tab)));
    }
    Ok(())
}

fn cmd_check(data: &DataArgs, json: bool) -> Result<()> {
    let loaded = load_path(&data.data)?;
    let findings = lint(&loaded.catalog);

    if json {
        let report = serde_json::json!({
            "source": loaded.source.label(),
            "summary": loaded.summary,
            "findings": findings,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} records loaded from {} ({} skipped, {} stat totals corrected)",
            "check:".bold(),
            loaded.summary.loaded,
            loaded.source.label(),
            loaded.summary.skipped,
            loaded.summary.corrected_totals
        );
        for f in &findings {
            let tag = match f.severity {
                Severity::Error => "error:".red().bold(),
                Severity::Warning => "warning:".yellow().bold(),
            };
            println!("  {tag} {f}");
        }
        if findings.is_empty() {
            println!("  {}", "no findings".green());
        }
    }

    if has_errors(&findings) {
        let errors = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        return Err(anyhow!("dataset check failed with {errors} error(s)"));
    }
    Ok(())
}
