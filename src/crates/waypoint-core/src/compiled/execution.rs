//! Graph execution methods (start, step, invoke)
//!
//! One call to [`CompiledGraph::step`] runs exactly one node:
//!
//! ```text
//!            ┌──────────── status != Running ───────────▶ Ok(None)
//!   step ────┤
//!            └─ run node(cursor) with a state snapshot
//!                 ├─ Err(e)            → FAILED, checkpoint, Err(e named after node)
//!                 ├─ Interrupt(p)      → SUSPENDED, cursor unchanged, checkpoint, Interrupt event
//!                 └─ Update(u)         → reducers merge u, Update event, then route:
//!                        ├─ next node  → cursor = next
//!                        ├─ none / END → FINISHED
//!                        └─ bad label  → FAILED, error handed out by the next step
//! ```
//!
//! A checkpoint that cannot be saved fails the run. An event that was already
//! produced is still returned and the store error comes back from the next step.

use super::{CompiledGraph, Run};
use crate::error::{GraphError, Result};
use crate::interrupt::PendingInterrupt;
use crate::node_result::NodeOutput;
use crate::state::RunState;
use crate::stream::StepEvent;
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use waypoint_checkpoint::{CheckpointSource, RunStatus};

impl CompiledGraph {
    /// Create a run positioned at the entry point
    ///
    /// `initial` is validated against the schema; declared fields it leaves out
    /// start unset (sequences start empty).
    pub fn start(&self, run_id: impl Into<String>, initial: RunState) -> Result<Run> {
        let state = self.graph.schema.complete(initial)?;
        let run = Run::new(run_id, &self.graph.entry, state);
        info!(run_id = %run.run_id, entry = %self.graph.entry, "Starting run");
        Ok(run)
    }

    /// Advance `run` by one node
    ///
    /// Returns `Ok(None)` once the run is suspended, finished or failed. When a
    /// node's update was merged but routing afterwards failed, this call still
    /// returns the update event and the run is already failed; the routing
    /// error comes back from the next call.
    #[tracing::instrument(skip(self, run), fields(run_id = %run.run_id, step = run.step))]
    pub async fn step(&self, run: &mut Run) -> Result<Option<StepEvent>> {
        if let Some(err) = run.deferred_error.take() {
            return Err(err);
        }
        if run.status != RunStatus::Running {
            return Ok(None);
        }

        let Some(node) = run.cursor.clone() else {
            run.finish();
            if let Err(err) = self.persist(run, CheckpointSource::Loop).await {
                run.fail(&err);
                return Err(err);
            }
            return Ok(None);
        };
        let Some(spec) = self.graph.node(&node) else {
            let err = GraphError::UnknownNode(node);
            run.fail(&err);
            self.persist_failure(run).await;
            return Err(err);
        };
        let executor = spec.executor.clone();

        debug!(node = %node, "Executing node");
        let output = match executor(run.state.clone()).await {
            Ok(output) => output,
            Err(e) => {
                let err = e.in_node(&node);
                error!(node = %node, error = %err, "Node execution failed");
                run.fail(&err);
                self.persist_failure(run).await;
                return Err(err);
            }
        };

        match output {
            NodeOutput::Interrupt(payload) => {
                let pending = PendingInterrupt::new(node.clone(), payload.clone());
                let event = StepEvent::Interrupt {
                    step: run.step,
                    node: node.clone(),
                    interrupt_id: pending.interrupt_id.clone(),
                    payload,
                };
                run.clear_decision();
                run.suspend(pending);
                info!(node = %node, "Run suspended, waiting for a decision");
                self.persist_step(run).await;
                Ok(Some(event))
            }
            NodeOutput::Update(update) => {
                if let Err(e) = self.graph.schema.apply(&mut run.state, &update) {
                    let err = GraphError::from(e).in_node(&node);
                    error!(node = %node, error = %err, "Rejected node update");
                    run.fail(&err);
                    self.persist_failure(run).await;
                    return Err(err);
                }

                let event = StepEvent::Update {
                    step: run.step,
                    node: node.clone(),
                    update,
                };
                run.step += 1;

                match self.graph.next_node(&node, &run.state) {
                    Ok(Some(next)) => {
                        debug!(from = %node, to = %next, "Routed");
                        run.cursor = Some(next);
                    }
                    Ok(None) => {
                        run.finish();
                        info!(last_node = %node, steps = run.step, "Run finished");
                    }
                    Err(err) => {
                        warn!(node = %node, error = %err, "Routing failed");
                        run.fail(&err);
                        run.deferred_error = Some(err);
                    }
                }
                run.clear_decision();
                self.persist_step(run).await;
                Ok(Some(event))
            }
        }
    }

    /// Run a fresh graph to completion and return its final state
    ///
    /// Fails with [`GraphError::Interrupted`] if a node suspends, since nothing
    /// can deliver a decision inside this call; interrupt-bearing graphs should
    /// be driven with [`stream`](Self::stream) and [`resume`](Self::resume).
    pub async fn invoke(&self, run_id: impl Into<String>, initial: RunState) -> Result<RunState> {
        let mut run = self.start(run_id, initial)?;
        {
            let mut events = self.stream(&mut run);
            while let Some(event) = events.next().await {
                if let StepEvent::Interrupt { node, payload, .. } = event? {
                    return Err(GraphError::Interrupted { node, payload });
                }
            }
        }
        Ok(run.into_state())
    }

    /// Checkpoint a run after one of its nodes produced an event
    ///
    /// On a store error the run fails and the error is deferred to the next
    /// `step`, unless an earlier failure is already waiting there.
    async fn persist_step(&self, run: &mut Run) {
        if let Err(err) = self.persist(run, CheckpointSource::Loop).await {
            error!(run_id = %run.run_id, error = %err, "Failed to save checkpoint");
            if run.deferred_error.is_none() {
                run.fail(&err);
                run.deferred_error = Some(err);
            }
        }
    }

    /// Checkpoint a run that already failed; the original error wins over a
    /// store error
    async fn persist_failure(&self, run: &Run) {
        if let Err(err) = self.persist(run, CheckpointSource::Loop).await {
            warn!(run_id = %run.run_id, error = %err, "Failed to save checkpoint of failed run");
        }
    }

    /// Write `run` to the checkpoint store, if one is configured
    pub(crate) async fn persist(&self, run: &Run, source: CheckpointSource) -> Result<()> {
        if let Some(store) = &self.checkpointer {
            store.save(run.to_checkpoint(source)).await?;
            debug!(run_id = %run.run_id, status = %run.status, "Checkpoint saved");
        }
        Ok(())
    }
}
