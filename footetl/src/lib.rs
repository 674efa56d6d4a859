pub mod pipeline;
pub mod settings;

use std::{future::Future, path::PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use footstorage::{
    config::{BatchConfig, ProbeConfig},
    models::PathProbe,
    FootStorage,
};
use tablefetcher::PostgrestClient;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::pipeline::{run_pipeline, PipelineOptions};

const ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Runs the footetl command line interface.
pub async fn run_cli() -> anyhow::Result<()> {
    let loaded = load_env_files();
    init_tracing();
    for path in loaded {
        info!("Loaded environment from {}", path);
    }

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Migrate(args)) => run_migrate(args).await?,
        Some(Command::Verify(args)) => run_verify(args).await?,
        Some(Command::Path(args)) => run_path(args).await?,
        None => {
            println!("No subcommand provided. Use --help to see available commands.");
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuilds the football graph from the relational source
    Migrate(MigrateArgs),
    /// Prints graph counts and the path probe without modifying anything
    Verify(VerifyArgs),
    /// Finds the shortest connection between two players
    Path(PathArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Base URL of the Supabase project
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,
    /// Supabase API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_key: Option<String>,
}

#[derive(Args)]
struct GraphArgs {
    /// Bolt URI of the target Neo4j instance
    #[arg(long, env = "NEO4J_URI")]
    neo4j_uri: Option<String>,
    #[arg(long, env = "NEO4J_USERNAME")]
    neo4j_username: Option<String>,
    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true)]
    neo4j_password: Option<String>,
}

#[derive(Args)]
struct BatchArgs {
    /// Rows requested per source page
    #[arg(long, default_value_t = 1000)]
    page_size: usize,
    #[arg(long, default_value_t = 500)]
    player_batch: usize,
    /// Batch size for PLAYED_FOR and REPRESENTS
    #[arg(long, default_value_t = 1000)]
    relationship_batch: usize,
}

#[derive(Args)]
struct ProbeArgs {
    #[arg(long, default_value = "Harry Kane")]
    probe_from: String,
    #[arg(long, default_value = "Bukayo Saka")]
    probe_to: String,
    #[arg(long, default_value_t = 6)]
    max_hops: u32,
    /// Skip the path probe after loading
    #[arg(long, default_value_t = false)]
    no_probe: bool,
}

impl ProbeArgs {
    fn config(&self) -> Option<ProbeConfig> {
        (!self.no_probe).then(|| ProbeConfig {
            from: self.probe_from.clone(),
            to: self.probe_to.clone(),
            max_hops: self.max_hops,
        })
    }
}

#[derive(Args)]
struct MigrateArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    graph: GraphArgs,
    #[command(flatten)]
    batches: BatchArgs,
    #[command(flatten)]
    probe: ProbeArgs,
    /// Load into an in-process graph instead of Neo4j
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// SQLite file recording each run
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// Print the run report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct VerifyArgs {
    #[command(flatten)]
    graph: GraphArgs,
    #[command(flatten)]
    probe: ProbeArgs,
}

#[derive(Args)]
struct PathArgs {
    #[command(flatten)]
    graph: GraphArgs,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long, default_value_t = 6)]
    max_hops: u32,
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Loads `.env.local` then `.env`; values already set are never overridden.
fn load_env_files() -> Vec<&'static str> {
    ENV_FILES
        .into_iter()
        .filter(|path| dotenvy::from_filename(path).is_ok())
        .collect()
}

async fn connect_graph(graph: GraphArgs, batches: BatchConfig) -> anyhow::Result<FootStorage> {
    let config =
        settings::graph_config(graph.neo4j_uri, graph.neo4j_username, graph.neo4j_password)?;
    info!("Connecting to Neo4j at {}...", config.uri);
    let storage = FootStorage::connect(&config, batches)
        .await
        .context("failed to connect to Neo4j")?;
    info!("Connected to Neo4j");
    Ok(storage)
}

async fn run_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let batches = settings::batch_config(
        args.batches.page_size,
        args.batches.player_batch,
        args.batches.relationship_batch,
    )?;
    let source = settings::resolve_source(args.source.supabase_url, args.source.supabase_key, |key| {
        std::env::var(key).ok()
    })?;
    let client = PostgrestClient::new(&source.url, &source.api_key)?;

    let mut storage = if args.dry_run {
        info!("Dry run: loading into an in-memory graph");
        FootStorage::in_memory(batches)
    } else {
        connect_graph(args.graph, batches).await?
    };
    if let Some(path) = &args.ledger {
        storage = storage
            .with_catalog(path)
            .with_context(|| format!("failed to open run ledger {}", path.display()))?;
    }

    let options = PipelineOptions {
        run_name: if args.dry_run { "migrate (dry run)" } else { "migrate" }.to_string(),
        probe: args.probe.config(),
    };

    let report = tokio::select! {
        report = run_pipeline(&client, &storage, &options) => report?,
        _ = shutdown_signal() => {
            anyhow::bail!("migration interrupted; the graph may be partially loaded");
        }
    };

    if !report.failed_collections.is_empty() {
        warn!(
            "Graph built from incomplete extraction of: {}",
            report
                .failed_collections
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

async fn run_verify(args: VerifyArgs) -> anyhow::Result<()> {
    let storage = connect_graph(args.graph, BatchConfig::default()).await?;

    let summary = storage.verifier.summarize().await?;
    println!(
        "players={} teams={} managers={} national_teams={} relationships={}",
        summary.players, summary.teams, summary.managers, summary.national_teams, summary.relationships
    );

    if let Some(probe) = args.probe.config() {
        match storage
            .verifier
            .probe_path(&probe.from, &probe.to, probe.max_hops)
            .await?
        {
            Some(path) => println!("{}", format_path(&path)),
            None => println!("No path between {} and {}", probe.from, probe.to),
        }
    }
    Ok(())
}

async fn run_path(args: PathArgs) -> anyhow::Result<()> {
    let storage = connect_graph(args.graph, BatchConfig::default()).await?;
    match storage
        .verifier
        .probe_path(&args.from, &args.to, args.max_hops)
        .await?
    {
        Some(path) => println!("{}", format_path(&path)),
        None => println!(
            "No path between {} and {} within {} hops",
            args.from, args.to, args.max_hops
        ),
    }
    Ok(())
}

/// Renders a path as `A -[TYPE]- B -[TYPE]- C (2 hops)`.
pub fn format_path(path: &PathProbe) -> String {
    let mut out = String::new();
    for (index, node) in path.nodes.iter().enumerate() {
        if index > 0 {
            let rel_type = path
                .relationships
                .get(index - 1)
                .map(String::as_str)
                .unwrap_or("?");
            out.push_str(&format!(" -[{rel_type}]- "));
        }
        out.push_str(node);
    }
    out.push_str(&format!(" ({} hops)", path.hops));
    out
}

async fn shutdown_signal() {
    wait_for_interrupt(signal::ctrl_c()).await
}

/// Resolves once `signal` reports an interrupt. A listener that failed to
/// register never resolves, so it cannot cut a run short.
async fn wait_for_interrupt(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            warn!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
