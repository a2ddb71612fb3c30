//! Stored run inspection and graph rendering

use super::{CliContext, Pipeline};
use anyhow::{Context, Result};
use std::sync::Arc;
use waypoint_core::{CheckpointStore, LanguageModel, ScriptedModel};
use waypoint_prebuilt::sdlc::{build_sdlc_graph, SdlcConfig};
use waypoint_prebuilt::{build_basic_chatbot, build_tool_chatbot, ClockTool, ToolRegistry};

/// Print a run's checkpoint as JSON
pub async fn handle_show(ctx: &CliContext, run_id: String) -> Result<()> {
    let checkpoint = ctx
        .store
        .load(&run_id)
        .await
        .with_context(|| format!("Failed to load run '{}'", run_id))?;
    println!("{}", serde_json::to_string_pretty(&checkpoint)?);
    Ok(())
}

/// Print stored run ids with their status
pub async fn handle_list(ctx: &CliContext) -> Result<()> {
    let run_ids = ctx.store.list().await?;
    if run_ids.is_empty() {
        println!("No runs in {}", ctx.store.directory().display());
        return Ok(());
    }
    for run_id in run_ids {
        let checkpoint = ctx.store.load(&run_id).await?;
        println!(
            "{:<32} {:<10} {}",
            run_id,
            checkpoint.status().to_string(),
            checkpoint.cursor.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn handle_delete(ctx: &CliContext, run_id: String) -> Result<()> {
    ctx.store.delete(&run_id).await?;
    println!("Deleted run '{}'", run_id);
    Ok(())
}

/// Mermaid source of a pipeline
pub fn render_graph(pipeline: Pipeline) -> Result<String> {
    // rendering never calls the model
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::default());
    let graph = match pipeline {
        Pipeline::Sdlc => build_sdlc_graph(model, SdlcConfig::default())?,
        Pipeline::Chat => build_basic_chatbot(model)?,
        Pipeline::ToolChat => build_tool_chatbot(model, ToolRegistry::new().with_tool(ClockTool))?,
    };
    Ok(graph.compile()?.to_mermaid())
}

pub fn handle_graph(pipeline: Pipeline) -> Result<()> {
    println!("{}", render_graph(pipeline)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pipeline_renders() {
        let sdlc = render_graph(Pipeline::Sdlc).unwrap();
        assert!(sdlc.starts_with("graph TD"));
        assert!(sdlc.contains("fix_test_cases"));

        let tools = render_graph(Pipeline::ToolChat).unwrap();
        assert!(tools.contains("tools"));

        assert!(render_graph(Pipeline::Chat).unwrap().contains("chatbot"));
    }
}
