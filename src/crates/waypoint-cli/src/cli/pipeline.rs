//! `run` and `resume` for the SDLC pipeline

use super::{drive, CliContext};
use anyhow::{bail, Context, Result};
use tracing::info;
use uuid::Uuid;
use waypoint_core::{CheckpointStore, CompiledGraph};
use waypoint_prebuilt::sdlc::{build_sdlc_graph, initial_state, SdlcConfig};

fn sdlc_app(ctx: &CliContext, max_revisions: Option<u32>) -> Result<CompiledGraph> {
    let model = ctx.model()?;
    let graph = build_sdlc_graph(model, SdlcConfig { max_revisions })
        .context("Failed to build the SDLC pipeline")?;
    Ok(graph.compile_with_checkpointer(ctx.store.clone())?)
}

/// Start a new pipeline run and stream it until the first review gate
pub async fn handle_run(
    ctx: &CliContext,
    requirements: String,
    run_id: Option<String>,
    max_revisions: Option<u32>,
) -> Result<()> {
    if requirements.trim().is_empty() {
        bail!("Requirements must not be empty");
    }
    let run_id = run_id.unwrap_or_else(|| format!("sdlc-{}", &Uuid::new_v4().simple().to_string()[..8]));
    if ctx.store.exists(&run_id).await? {
        bail!(
            "Run '{}' already exists; resume it or delete it first",
            run_id
        );
    }

    let app = sdlc_app(ctx, max_revisions)?;
    let mut run = app.start(run_id.as_str(), initial_state(requirements))?;
    info!(run_id = %run_id, "Started SDLC run");
    println!("Run id: {}", run_id);
    drive(&app, &mut run).await?;
    Ok(())
}

/// Deliver a reviewer decision and continue to the next gate
pub async fn handle_resume(
    ctx: &CliContext,
    run_id: String,
    decision: String,
    max_revisions: Option<u32>,
) -> Result<()> {
    let app = sdlc_app(ctx, max_revisions)?;
    let mut run = app
        .resume(&run_id, decision)
        .await
        .with_context(|| format!("Failed to resume run '{}'", run_id))?;
    drive(&app, &mut run).await?;
    Ok(())
}
