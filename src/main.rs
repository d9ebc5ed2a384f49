//! Command-line entry point for the diffuzz orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use diffuzz::{
    CommandGenerator, CommandToolchain, Config, ConfigFile, Endian, JsonSink, LogWriter,
    OutputLayout, Pipeline, ProcessTree, RuntimeError, Scheduler, Subscribe,
};

/// Differential compiler fuzzing: generate, compile across a matrix, diff.
#[derive(Parser, Debug)]
#[command(name = "diffuzz", version, about)]
struct Cli {
    /// Path to the JSON configuration (generators and compiler sets).
    #[arg(short, long)]
    config: PathBuf,

    /// Base directory for temp and catch output (defaults to the working
    /// directory).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Target byte order, used to pick the compiler set.
    #[arg(long, value_enum, default_value_t = Endian::Little)]
    endian: Endian,

    /// Tasks per round for every generator.
    #[arg(long)]
    tasks_per_round: Option<usize>,

    /// Treat run timeouts as hard failures instead of soft ones.
    #[arg(long = "no-timeout", action = ArgAction::SetFalse)]
    partial_timeout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::default();
    if let Some(tasks) = cli.tasks_per_round {
        cfg.tasks_per_round = tasks;
    }
    cfg.partial_timeout = cli.partial_timeout;

    let file = ConfigFile::load(&cli.config).context("loading configuration")?;
    let compilers = Arc::new(
        file.resolve_compilers(std::env::consts::OS, cli.endian)
            .context("resolving compiler set")?,
    );
    let generators: Vec<_> = file.generators.iter().cloned().map(Arc::new).collect();

    let base = cli
        .output
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)
        .context("resolving output directory")?;
    let layout = OutputLayout::new(&base);
    layout
        .setup(&generators)
        .context("creating output directories")?;

    tracing::info!(
        generators = generators.len(),
        compilers = compilers.len(),
        tasks_per_round = cfg.tasks_per_round,
        output = %base.display(),
        "starting fuzzing runtime"
    );

    let tree = Arc::new(ProcessTree::new());
    let pipeline = Pipeline {
        generate: Arc::new(CommandGenerator::new(tree.clone(), &cfg)),
        toolchain: Arc::new(CommandToolchain::new(tree.clone(), &cfg)),
        analyze: Arc::new(JsonSink::new()),
    };
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let scheduler = Scheduler::new(cfg, subscribers, tree);

    match scheduler.run(generators, compilers, &layout, pipeline).await {
        Ok(()) => Ok(()),
        // Interrupted runs exit cleanly: the process tree has already been
        // force-terminated and everything durable lives in catch/.
        Err(err @ RuntimeError::GraceExceeded { .. }) => {
            tracing::error!(error = %err, label = err.as_label(), "forced shutdown");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
