use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fedicheck_core::{Category, OutcomeGroups};
use instance_probe::{HttpTransport, ProbeOptions, TransportOptions};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod targets;

use config::{CheckArgs, Settings};

const DEFAULT_LOG_FILTER: &str = "fedicheck=info,instance_probe=info,snapshot_store=info";

#[derive(Debug, Parser)]
#[command(name = "fedicheck", version, about = "NodeInfo health census for federated instances")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./fedicheck.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log every stage transition (debug level) unless RUST_LOG is set
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Probe every listed instance and update the snapshot
    Check {
        /// Target listing (default: domains.txt)
        #[arg(long, value_name = "FILE")]
        targets: Option<PathBuf>,
        /// Snapshot file, read as the previous run and overwritten (default: domains.json)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Timeout per request in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Max redirects followed per request
        #[arg(long)]
        redirects: Option<usize>,
        /// Accepted nodeinfo schema relation prefix
        #[arg(long)]
        schema_prefix: Option<String>,
        /// User-Agent header sent with every request
        #[arg(long)]
        user_agent: Option<String>,
        /// Treat the listing as one target per line instead of `[*]`-marked lines
        #[arg(long, default_value_t = false)]
        plain: bool,
        /// Write indented JSON
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) if verbose => EnvFilter::new(DEFAULT_LOG_FILTER.replace("=info", "=debug")),
        Err(_) => EnvFilter::new(DEFAULT_LOG_FILTER),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let loaded_cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Version => {
            println!("fedicheck {} (core {})", env!("CARGO_PKG_VERSION"), fedicheck_core::version());
        }
        Commands::Check { targets, out, timeout_ms, redirects, schema_prefix, user_agent, plain, pretty } => {
            let args = CheckArgs { targets, out, timeout_ms, redirects, schema_prefix, user_agent, plain, pretty };
            check(Settings::resolve(args, loaded_cfg.as_ref()))?;
        }
    }
    Ok(())
}

/// `unresolved=3 not_functioning=1 ...` in snapshot key order.
fn summary_line(groups: &OutcomeGroups) -> String {
    Category::ALL
        .iter()
        .map(|c| format!("{}={}", c.as_str(), groups.count(*c)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn check(settings: Settings) -> Result<()> {
    let list = targets::load_targets(&settings.targets, settings.plain_list)?;
    let total = list.len();
    info!(targets = total, list = %settings.targets.display(), "loaded target list");

    let prior = snapshot_store::load_or_empty(&settings.output);

    let transport = HttpTransport::new(&TransportOptions {
        timeout: settings.timeout,
        user_agent: settings.user_agent.clone(),
        redirects: settings.redirects,
    })
    .context("building http client")?;
    let opts = ProbeOptions { schema_prefix: settings.schema_prefix.clone() };

    let started = Instant::now();
    let rt = tokio::runtime::Runtime::new()?;
    let groups = rt.block_on(instance_probe::probe_all(Arc::new(transport), list.clone(), opts));

    info!(
        summary = %summary_line(&groups),
        duration_ms = started.elapsed().as_millis() as u64,
        "probing finished"
    );
    if groups.total() != total {
        let recorded: HashSet<&str> = groups.iter_targets().map(|(t, _)| t).collect();
        let missing: Vec<&str> = list.iter().map(String::as_str).filter(|t| !recorded.contains(t)).collect();
        warn!(expected = total, recorded = groups.total(), missing = ?missing, "some targets did not report an outcome");
    }

    let snapshot = snapshot_store::merge_snapshot(&prior, &groups, OffsetDateTime::now_utc());
    snapshot_store::save(&settings.output, &snapshot, settings.pretty)
        .with_context(|| format!("saving snapshot to {}", settings.output.display()))?;

    info!(out = %settings.output.display(), "{} domains checked", total);
    Ok(())
}
