//! regcopilot CLI: run the compliance pipeline, seed the store, inspect output.

mod backend;
mod display;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use regcopilot_agents::{RunOutcome, Workflow, seed_corpus};
use regcopilot_core::{PipelineConfig, SourceMode, StoreBackend};
use regcopilot_store::read_result;
use tracing_subscriber::EnvFilter;

use crate::display::View;

/// Regulatory change copilot: summarise new regulations, map them to internal
/// policies and controls, and draft impact assessments and action plans.
#[derive(Parser, Debug)]
#[command(name = "regcopilot", version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config/regcopilot.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that may also come from the environment.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Document source: local or live.
    #[arg(long, global = true, env = "REGCOPILOT_MODE")]
    mode: Option<SourceMode>,

    /// Chat model name.
    #[arg(long, global = true, env = "MODEL_NAME")]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, global = true, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// Remote embedding model name.
    #[arg(long, global = true, env = "EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Directory for the persistent vector store.
    #[arg(long, global = true, env = "VECTOR_DB_PATH")]
    vector_db_path: Option<PathBuf>,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed the store and run every pipeline stage once.
    Run {
        /// Ignore cached summaries and refetch from the source.
        #[arg(long, env = "FORCE_REFRESH", value_parser = clap::builder::BoolishValueParser::new())]
        force_refresh: bool,

        /// Skip loading policies and controls into the store.
        #[arg(long)]
        skip_seed: bool,

        /// Where to write the workflow result.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load policies, controls and regulatory texts into the store.
    Seed,

    /// Print a previously written workflow result.
    Show {
        #[arg(long, value_enum, default_value_t = View::All)]
        view: View,

        /// Result file to read instead of the configured output path.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(base) = &self.api_base {
            config.model.api_base = base.clone();
        }
        if let Some(model) = &self.embedding_model {
            config.embedding.model = model.clone();
        }
        if let Some(path) = &self.vector_db_path {
            config.store.path = path.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    tracing::debug!("regcopilot v{}", env!("CARGO_PKG_VERSION"));

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = PipelineConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.overrides.apply(&mut config);

    match cli.command {
        Commands::Run {
            force_refresh,
            skip_seed,
            output,
        } => {
            config.force_refresh |= force_refresh;
            if let Some(output) = output {
                config.output_path = output;
            }
            config.validate()?;
            run(&config, cli.overrides.api_key, skip_seed).await
        }
        Commands::Seed => {
            require_persistent_store(&config)?;
            config.validate()?;
            let embedder = backend::embedder(&config, cli.overrides.api_key)?;
            let store = backend::store(&config, embedder).await?;
            let report =
                seed_corpus(store.as_ref(), &config.corpus, &config.sources.regulatory_dir).await;
            let stored = store.count().await.context("counting stored documents")?;
            println!(
                "Seeded {} documents ({} policies, {} regulations, {} controls); store holds {}",
                report.total(),
                report.policies,
                report.regulations,
                report.controls,
                stored
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { view, input } => {
            let path = input.unwrap_or(config.output_path);
            let result =
                read_result(&path).with_context(|| format!("reading {}", path.display()))?;
            print!("{}", display::render(&result, view));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Seeding an in-process store is lost when the command exits.
fn require_persistent_store(config: &PipelineConfig) -> anyhow::Result<()> {
    if config.store.backend == StoreBackend::Memory {
        anyhow::bail!("seed needs a persistent store; set store.backend = \"lance\"");
    }
    Ok(())
}

async fn run(
    config: &PipelineConfig,
    api_key: Option<String>,
    skip_seed: bool,
) -> anyhow::Result<ExitCode> {
    let generator = backend::generator(config, api_key.clone())?;
    let embedder = backend::embedder(config, api_key)?;
    let store = backend::store(config, embedder).await?;
    let source = backend::source(config)?;

    if !skip_seed {
        seed_corpus(store.as_ref(), &config.corpus, &config.sources.regulatory_dir).await;
    }

    let report = Workflow::from_config(config, source, generator, store)
        .run()
        .await?;
    match report.outcome {
        RunOutcome::Completed(result) => {
            println!(
                "Analysed {} regulatory updates ({} failed steps); wrote {}",
                result.regulatory_updates.len(),
                result.failure_count(),
                config.output_path.display()
            );
        }
        RunOutcome::HaltedEmpty => {
            println!("No regulatory updates found; nothing written.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
