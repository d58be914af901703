//! bulkfile - Bulk compress, move and delete over a file store.
//!
//! Usage:
//!   bulkfile list [DIR]                      List a directory
//!   bulkfile compress NAMES...               Zip entries into an archive
//!   bulkfile move --to DEST NAMES...         Move entries to another folder
//!   bulkfile delete [--yes] NAMES...         Delete entries after confirmation
//!   bulkfile --help                          Show help

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bulkfile_core::{
    BulkAction, BulkConfig, ConfirmationPrompt, DirectoryEntry, LocalGatewayConfig,
    OperationOutcome,
};
use bulkfile_ops::{
    BulkOperationOrchestrator, ConfirmationGate, DirectoryCache, LocalFileGateway,
    SelectionStore, TracingNotifier, normalize_directory,
};

#[derive(Parser)]
#[command(
    name = "bulkfile",
    version,
    about = "Bulk compress, move and delete for file stores",
    long_about = "bulkfile runs grouped actions on a selection of entries in one \
                  directory. Deletes ask for confirmation first."
)]
struct Cli {
    /// Store root (overrides the config file, defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory of the store
    List {
        /// Store directory
        #[arg(default_value = "/")]
        dir: String,
    },

    /// Compress entries into a zip archive
    Compress(Selection),

    /// Move entries to another folder
    Move {
        /// Destination folder (absolute, or relative to --dir)
        #[arg(short, long)]
        to: String,

        #[command(flatten)]
        selection: Selection,
    },

    /// Delete entries
    Delete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        selection: Selection,
    },
}

#[derive(Args)]
struct Selection {
    /// Store directory containing the entries
    #[arg(short, long, default_value = "/")]
    dir: String,

    /// Entry names to act on
    #[arg(required = true)]
    names: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let gateway_config = gateway_config(cli.root, config.gateway)?;

    debug!(target: "bulkfile::cli", root = %gateway_config.root.display(), "using local store");
    let gateway = Arc::new(LocalFileGateway::new(gateway_config));
    let cache = Arc::new(DirectoryCache::new(gateway.clone()));

    let (action, assume_yes, selection) = match cli.command {
        Command::List { dir } => {
            let entries = cache
                .refresh(&dir)
                .await
                .wrap_err_with(|| format!("Failed to list {dir}"))?;
            print_listing(&entries, cli.format)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Compress(selection) => (BulkAction::Compress, false, selection),
        Command::Move { to, selection } => (BulkAction::move_to(to), false, selection),
        Command::Delete { yes, selection } => (BulkAction::Delete, yes, selection),
    };

    let directory = normalize_directory(&selection.dir);
    cache
        .refresh(&directory)
        .await
        .wrap_err_with(|| format!("Failed to list {directory}"))?;
    for name in &selection.names {
        if !cache.contains(&directory, name) {
            bail!("No entry named '{name}' in {directory}");
        }
    }

    let store = SelectionStore::new(directory.clone());
    store.select_all(selection.names.iter().map(String::as_str));

    let orchestrator = BulkOperationOrchestrator::new(
        gateway,
        cache.clone(),
        store,
        Arc::new(TracingNotifier),
    )
    .with_config(config.orchestrator);

    let confirmer = tokio::spawn(answer_prompt(orchestrator.gate().clone(), assume_yes));
    let outcome = orchestrator.dispatch(action, &directory).await;
    confirmer.abort();

    print_outcome(&outcome, cache.entries(&directory).as_deref(), cli.format)?;

    if outcome.success || outcome.is_cancelled() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BulkConfig> {
    let Some(path) = path else {
        return Ok(BulkConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).wrap_err("Invalid config file")
}

/// `--root` wins over the config file's root; other gateway settings are kept.
fn gateway_config(
    root: Option<PathBuf>,
    configured: Option<LocalGatewayConfig>,
) -> Result<LocalGatewayConfig> {
    let mut config = match (root, configured) {
        (Some(root), Some(mut config)) => {
            config.root = root;
            config
        }
        (Some(root), None) => LocalGatewayConfig::new(root),
        (None, Some(config)) => config,
        (None, None) => LocalGatewayConfig::new("."),
    };
    config.root = config.root.canonicalize().context("Invalid root")?;
    Ok(config)
}

/// Wait for the gate to ask, then answer from stdin.
async fn answer_prompt(gate: Arc<ConfirmationGate>, assume_yes: bool) {
    let mut rx = gate.subscribe();
    let prompt = match rx.wait_for(|state| state.prompt().is_some()).await {
        Ok(state) => state.prompt().cloned(),
        Err(_) => None,
    };
    let Some(prompt) = prompt else {
        return;
    };

    let confirmed = assume_yes
        || tokio::task::spawn_blocking(move || ask(&prompt))
            .await
            .ok()
            .and_then(|answer| answer.ok())
            .unwrap_or(false);

    if confirmed {
        gate.confirm();
    } else {
        gate.dismiss();
    }
}

fn ask(prompt: &ConfirmationPrompt) -> io::Result<bool> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{}", prompt.title)?;
    writeln!(stderr, "{}", prompt.body)?;
    write!(stderr, "{} [y/N] ", prompt.confirm_label)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_outcome(
    outcome: &OperationOutcome,
    listing: Option<&[DirectoryEntry]>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if outcome.success || outcome.is_cancelled() {
                println!("{}", outcome.summary());
            } else {
                eprintln!("{}", outcome.summary());
            }
            if outcome.success {
                if let Some(entries) = listing {
                    println!();
                    print_listing(entries, format)?;
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
    }
    Ok(())
}

fn print_listing(entries: &[DirectoryEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!(" (empty)");
            }
            for entry in entries {
                let size = if entry.is_folder() {
                    "-".to_string()
                } else {
                    format_size(entry.size)
                };
                let modified = entry
                    .metadata
                    .modified
                    .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let suffix = if entry.is_folder() { "/" } else { "" };
                println!(" {:>10}  {:<16}  {}{}", size, modified, entry.name, suffix);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
