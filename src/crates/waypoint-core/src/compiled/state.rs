//! Checkpoint-backed run management (resume, inspection, deletion)

use super::{CompiledGraph, Run};
use crate::error::{GraphError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use waypoint_checkpoint::{CheckpointSource, CheckpointStore};

impl CompiledGraph {
    fn store(&self) -> Result<&Arc<dyn CheckpointStore>> {
        self.checkpointer.as_ref().ok_or(GraphError::NoCheckpointer)
    }

    /// Load a suspended run from its checkpoint and deliver `value` to it
    ///
    /// The decision is stored under the reserved decision field and the run is
    /// marked running with its cursor still on the node that interrupted, so
    /// the next `step`/`stream` re-enters that node.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotFound`] if no checkpoint exists for `run_id`
    /// - [`GraphError::InvalidResume`] if the run is not suspended
    /// - [`GraphError::State`] if the stored state does not fit this graph's schema
    #[tracing::instrument(skip(self, value))]
    pub async fn resume(&self, run_id: &str, value: impl Into<Value> + Send) -> Result<Run> {
        let checkpoint = self.store()?.load(run_id).await?;
        let mut run = Run::from_checkpoint(checkpoint);
        self.graph.schema.validate(&run.state)?;
        if let Some(cursor) = &run.cursor {
            if !self.graph.contains(cursor) {
                return Err(GraphError::UnknownNode(cursor.clone()));
            }
        }
        self.resume_run(&mut run, value).await?;
        Ok(run)
    }

    /// Deliver `value` to a suspended run held in memory
    pub async fn resume_run(&self, run: &mut Run, value: impl Into<Value> + Send) -> Result<()> {
        run.inject_decision(value.into())?;
        info!(
            run_id = %run.run_id,
            node = run.cursor.as_deref().unwrap_or_default(),
            "Resuming run"
        );
        self.persist(run, CheckpointSource::Update).await
    }

    /// Rebuild a run from its checkpoint without changing it
    ///
    /// A run that was still `Running` when its process stopped can be continued
    /// by streaming the returned run.
    pub async fn load_run(&self, run_id: &str) -> Result<Run> {
        let checkpoint = self.store()?.load(run_id).await?;
        Ok(Run::from_checkpoint(checkpoint))
    }

    /// Forget a run's checkpoint
    pub async fn delete_run(&self, run_id: &str) -> Result<()> {
        self.store()?.delete(run_id).await?;
        Ok(())
    }

    /// Run ids with a stored checkpoint
    pub async fn list_runs(&self) -> Result<Vec<String>> {
        Ok(self.store()?.list().await?)
    }
}
