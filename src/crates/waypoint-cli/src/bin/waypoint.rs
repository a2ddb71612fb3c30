//! waypoint CLI - drive workflow graphs from the terminal
//!
//! Main entry point for the waypoint command-line tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use waypoint_cli::cli::{chat, pipeline, runs};
use waypoint_cli::config::Provider;
use waypoint_cli::{logging, CliContext, ConfigLoader, Pipeline};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "waypoint - workflow graphs with human approval gates", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Extra configuration file applied on top of the user and project files
    #[arg(long, global = true, env = "WAYPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding run checkpoints
    #[arg(long, global = true, env = "WAYPOINT_CHECKPOINT_DIR")]
    checkpoint_dir: Option<PathBuf>,

    /// Model provider, overriding the configuration
    #[arg(long, global = true, value_enum)]
    provider: Option<Provider>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a pipeline run and stream it until the first review gate
    Run {
        /// Pipeline to run
        #[arg(long, value_enum, default_value = "sdlc")]
        pipeline: Pipeline,
        /// Project requirements
        #[arg(long)]
        requirements: String,
        /// Run id; generated when omitted
        #[arg(long)]
        run_id: Option<String>,
        /// Approve a stage automatically after this many feedback rounds
        #[arg(long)]
        max_revisions: Option<u32>,
    },

    /// Answer a review gate: "approve" or feedback text
    Resume {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        decision: String,
        /// Must match the value the run was started with
        #[arg(long)]
        max_revisions: Option<u32>,
    },

    /// Print a run's checkpoint as JSON
    Show {
        #[arg(long)]
        run_id: String,
    },

    /// List stored runs
    List,

    /// Delete a stored run
    Delete {
        #[arg(long)]
        run_id: String,
    },

    /// Print a pipeline as a Mermaid diagram
    Graph {
        #[arg(long, value_enum, default_value = "sdlc")]
        pipeline: Pipeline,
    },

    /// Send one chat message; the conversation is kept under the run id
    Chat {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        message: String,
        /// Let the model call tools (currently: clock)
        #[arg(long)]
        tools: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new().with_explicit(cli.config).load().await?;
    if let Some(dir) = cli.checkpoint_dir {
        config.checkpoint.dir = dir;
    }
    if let Some(provider) = cli.provider {
        config.model.provider = provider;
    }
    logging::init(&config.logging.filter);

    if let Commands::Graph { pipeline } = cli.command {
        return runs::handle_graph(pipeline);
    }

    let ctx = CliContext::open(config).await?;
    match cli.command {
        Commands::Run {
            pipeline: Pipeline::Sdlc,
            requirements,
            run_id,
            max_revisions,
        } => pipeline::handle_run(&ctx, requirements, run_id, max_revisions).await,
        Commands::Run { pipeline, .. } => Err(anyhow::anyhow!(
            "{:?} is interactive; use `waypoint chat` instead",
            pipeline
        )),
        Commands::Resume {
            run_id,
            decision,
            max_revisions,
        } => pipeline::handle_resume(&ctx, run_id, decision, max_revisions).await,
        Commands::Show { run_id } => runs::handle_show(&ctx, run_id).await,
        Commands::List => runs::handle_list(&ctx).await,
        Commands::Delete { run_id } => runs::handle_delete(&ctx, run_id).await,
        Commands::Chat {
            run_id,
            message,
            tools,
        } => chat::handle_chat(&ctx, run_id, message, tools).await,
        Commands::Graph { pipeline } => runs::handle_graph(pipeline),
    }
}
