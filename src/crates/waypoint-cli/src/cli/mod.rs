//! Command handlers
//!
//! Each handler receives a [`CliContext`] built once in `main` from the merged
//! configuration. Step events and results go to stdout; logs go to stderr.

pub mod chat;
pub mod pipeline;
pub mod runs;

use crate::config::{Provider, WaypointConfig};
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use waypoint_core::{CompiledGraph, FileCheckpointStore, LanguageModel, Run, StepEvent};
use waypoint_llm::{EchoModel, GroqClient, RemoteLlmConfig};

/// Graphs the CLI knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Pipeline {
    /// User stories → design → code → security → tests, with approval gates
    Sdlc,
    /// Single-node chatbot
    Chat,
    /// Chatbot with tool calling
    ToolChat,
}

/// Shared state for command handlers
pub struct CliContext {
    pub config: WaypointConfig,
    pub store: Arc<FileCheckpointStore>,
}

impl CliContext {
    /// Open the checkpoint directory named by `config`
    pub async fn open(config: WaypointConfig) -> Result<Self> {
        let dir = &config.checkpoint.dir;
        let store = FileCheckpointStore::open(dir.clone())
            .await
            .with_context(|| format!("Failed to open checkpoint directory {}", dir.display()))?;
        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    /// Build the configured language model
    pub fn model(&self) -> Result<Arc<dyn LanguageModel>> {
        let settings = &self.config.model;
        match settings.provider {
            Provider::Echo => Ok(Arc::new(EchoModel::new())),
            Provider::Groq => {
                let config = RemoteLlmConfig::from_env(
                    &settings.api_key_env,
                    settings.base_url.as_str(),
                    settings.model.as_str(),
                )
                .with_context(|| {
                    format!(
                        "Set {} or choose another provider with --provider echo",
                        settings.api_key_env
                    )
                })?
                .with_timeout(Duration::from_secs(settings.timeout_secs))
                .with_max_retries(settings.max_retries);
                info!(model = %settings.model, "Using Groq model");
                Ok(Arc::new(GroqClient::new(config).context("Failed to create Groq client")?))
            }
        }
    }
}

/// One line per step event
pub fn format_event(event: &StepEvent) -> String {
    match event {
        StepEvent::Update { step, node, update } => {
            let fields: Vec<&str> = update.fields().collect();
            format!("[{}] {} updated {}", step, node, fields.join(", "))
        }
        StepEvent::Interrupt { step, node, .. } => {
            format!("[{}] {} is waiting for a decision", step, node)
        }
    }
}

/// The command that continues a suspended run
pub fn resume_command(run_id: &str) -> String {
    format!("waypoint resume --run-id {} --decision \"approve\"", run_id)
}

/// Advance `run` until it pauses or stops, printing every event
///
/// Returns the interrupt payload when the run suspended.
pub async fn drive(app: &CompiledGraph, run: &mut Run) -> Result<Option<Value>> {
    let run_id = run.run_id().to_string();
    let mut payload = None;
    {
        let mut events = app.stream(run);
        while let Some(event) = events.next().await {
            let event = event.with_context(|| format!("Run '{}' failed", run_id))?;
            println!("{}", format_event(&event));
            if let StepEvent::Interrupt { payload: p, .. } = event {
                payload = Some(p);
            }
        }
    }

    match &payload {
        Some(p) => {
            println!("{}", serde_json::to_string_pretty(p)?);
            println!();
            println!("Approve with:\n  {}", resume_command(&run_id));
            println!("or send feedback with --decision \"<what to change>\"");
        }
        None => println!("Run '{}' is {}", run_id, run.status()),
    }
    Ok(payload)
}
