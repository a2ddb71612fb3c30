//! Review Cycle - produce, review, approve or send back
//!
//! A producer writes an artifact into a state field, a reviewer node pauses the
//! run so a human can look at it, and a conditional edge either moves on or
//! sends the work back with feedback:
//!
//! ```text
//!   producer ──▶ reviewer ──"approve"──▶ approve_target
//!      ▲            │
//!      │        "revise"
//!      │            ▼
//!      └──── revise_target (usually the producer itself)
//! ```
//!
//! The engine knows nothing about this pattern. [`ReviewCycle`] only wires
//! ordinary nodes and edges:
//!
//! - the reviewer interrupts with `{stage, title, artifact, content, revision}`
//!   while no decision is present;
//! - on resume it records the outcome, stores feedback text and bumps the
//!   revision counter, and appends an entry to the shared `review_log`;
//! - the router reads the outcome field and, with a revision cap, forces
//!   approval once the counter reaches it.
//!
//! Producers pair with [`produce_with_feedback`], which keeps a reviewed
//! artifact stable across re-entry and regenerates it only when feedback is
//! pending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use tracing::{debug, info};
use waypoint_core::{
    Decision, GraphError, NodeId, NodeOutput, PartialUpdate, Result, RunState, StateGraph,
    StateSchema,
};

/// Shared append-only log of every review decision
pub const REVIEW_LOG: &str = "review_log";

/// Outcome stored when the reviewer approved
pub const OUTCOME_APPROVED: &str = "approved";

/// Outcome stored when the reviewer sent feedback
pub const OUTCOME_FEEDBACK: &str = "feedback";

/// Router label leading to the approve target
pub const APPROVE_LABEL: &str = "approve";

/// Router label leading back to the revise target
pub const REVISE_LABEL: &str = "revise";

/// One entry of the [`REVIEW_LOG`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub stage: String,
    /// [`OUTCOME_APPROVED`] or [`OUTCOME_FEEDBACK`]
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Revision counter when the decision was made
    pub revision: i64,
    pub at: DateTime<Utc>,
}

/// Decode the review log of `state`; an unset log is empty
pub fn review_log(state: &RunState) -> Result<Vec<ReviewRecord>> {
    Ok(state.get_as(REVIEW_LOG)?.unwrap_or_default())
}

/// One reviewed stage of a pipeline
#[derive(Debug, Clone)]
pub struct ReviewCycle {
    /// Short stage key, also the default prefix of the cycle's fields
    pub stage: String,
    /// Human readable title shown in the interrupt payload
    pub title: String,
    /// Name of the reviewer node this cycle installs
    pub reviewer: NodeId,
    /// Node whose output is reviewed; gets an edge into the reviewer
    pub producer: Option<NodeId>,
    pub artifact_field: String,
    pub feedback_field: String,
    pub outcome_field: String,
    pub revisions_field: String,
    /// Where feedback sends the run
    pub revise_target: Option<NodeId>,
    /// Where approval sends the run; may be [`END`](waypoint_core::END)
    pub approve_target: Option<NodeId>,
    /// Force approval once this many revisions were requested
    pub max_revisions: Option<u32>,
}

impl ReviewCycle {
    /// Review `artifact_field` at node `reviewer`
    ///
    /// Feedback, outcome and revision fields default to `{stage}_feedback`,
    /// `{stage}_outcome` and `{stage}_revisions`.
    pub fn new(
        stage: impl Into<String>,
        reviewer: impl Into<NodeId>,
        artifact_field: impl Into<String>,
    ) -> Self {
        let stage = stage.into();
        Self {
            title: stage.clone(),
            reviewer: reviewer.into(),
            producer: None,
            artifact_field: artifact_field.into(),
            feedback_field: format!("{}_feedback", stage),
            outcome_field: format!("{}_outcome", stage),
            revisions_field: format!("{}_revisions", stage),
            revise_target: None,
            approve_target: None,
            max_revisions: None,
            stage,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Connect `producer → reviewer`; feedback returns to the producer unless
    /// [`revise_to`](Self::revise_to) says otherwise
    pub fn with_producer(mut self, producer: impl Into<NodeId>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    pub fn with_feedback_field(mut self, field: impl Into<String>) -> Self {
        self.feedback_field = field.into();
        self
    }

    pub fn revise_to(mut self, target: impl Into<NodeId>) -> Self {
        self.revise_target = Some(target.into());
        self
    }

    pub fn approve_to(mut self, target: impl Into<NodeId>) -> Self {
        self.approve_target = Some(target.into());
        self
    }

    pub fn with_max_revisions(mut self, max: u32) -> Self {
        self.max_revisions = Some(max);
        self
    }

    /// Declare the cycle's fields on `schema`
    ///
    /// Fields another cycle already declared (the artifact reviewed twice, the
    /// shared log) are left as they are.
    pub fn extend_schema(&self, mut schema: StateSchema) -> Result<StateSchema> {
        for field in [&self.artifact_field, &self.feedback_field, &self.outcome_field] {
            if !schema.contains(field) {
                schema = schema.text(field.as_str())?;
            }
        }
        if !schema.contains(&self.revisions_field) {
            schema = schema.scalar(self.revisions_field.as_str())?;
        }
        if !schema.contains(REVIEW_LOG) {
            schema = schema.sequence(REVIEW_LOG)?;
        }
        Ok(schema)
    }

    fn resolved_revise_target(&self) -> Result<NodeId> {
        self.revise_target
            .clone()
            .or_else(|| self.producer.clone())
            .ok_or_else(|| {
                GraphError::Validation(format!(
                    "review stage '{}' has neither a producer nor a revise target",
                    self.stage
                ))
            })
    }

    /// Add the reviewer node and its edges to `graph`
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] when the cycle has no approve target or no
    /// way back for feedback, plus anything the builder rejects.
    pub fn install(&self, graph: &mut StateGraph) -> Result<()> {
        let approve_target = self.approve_target.clone().ok_or_else(|| {
            GraphError::Validation(format!("review stage '{}' has no approve target", self.stage))
        })?;
        let revise_target = self.resolved_revise_target()?;

        let cycle = self.clone();
        graph.add_node(self.reviewer.as_str(), move |state: RunState| {
            let cycle = cycle.clone();
            async move { cycle.review(&state) }
        })?;

        if let Some(producer) = &self.producer {
            graph.add_edge(producer.as_str(), self.reviewer.as_str())?;
        }
        if self.producer.as_ref() != Some(&revise_target) {
            graph.add_edge(revise_target.as_str(), self.reviewer.as_str())?;
        }

        let outcome_field = self.outcome_field.clone();
        let revisions_field = self.revisions_field.clone();
        let max_revisions = self.max_revisions;
        graph.add_conditional_edge(
            self.reviewer.as_str(),
            move |state: &RunState| route(state, &outcome_field, &revisions_field, max_revisions),
            [(APPROVE_LABEL, approve_target), (REVISE_LABEL, revise_target)],
        )?;
        Ok(())
    }

    fn revisions(&self, state: &RunState) -> i64 {
        state.get_i64(&self.revisions_field).unwrap_or(0)
    }

    /// The reviewer node body
    fn review(&self, state: &RunState) -> Result<NodeOutput> {
        let revision = self.revisions(state);
        let Some(decision) = Decision::from_state(state) else {
            debug!(stage = %self.stage, revision, "Waiting for review");
            return Ok(NodeOutput::interrupt(json!({
                "stage": self.stage,
                "title": self.title,
                "artifact": self.artifact_field,
                "content": state.get(&self.artifact_field).cloned().unwrap_or(Value::Null),
                "revision": revision,
            })));
        };

        let mut record = ReviewRecord {
            stage: self.stage.clone(),
            outcome: OUTCOME_APPROVED.to_string(),
            feedback: None,
            revision,
            at: Utc::now(),
        };
        let update = match decision {
            Decision::Approve => {
                info!(stage = %self.stage, revision, "Stage approved");
                PartialUpdate::new().set(&self.outcome_field, OUTCOME_APPROVED)
            }
            Decision::Feedback(text) => {
                info!(stage = %self.stage, revision, "Stage sent back with feedback");
                record.outcome = OUTCOME_FEEDBACK.to_string();
                let update = PartialUpdate::new()
                    .set(&self.outcome_field, OUTCOME_FEEDBACK)
                    .set(&self.feedback_field, text.as_str())
                    .set(&self.revisions_field, revision + 1);
                record.feedback = Some(text);
                update
            }
        };
        Ok(update.set(REVIEW_LOG, serde_json::to_value(&record)?).into())
    }
}

fn route(
    state: &RunState,
    outcome_field: &str,
    revisions_field: &str,
    max_revisions: Option<u32>,
) -> String {
    if let Some(max) = max_revisions {
        let revisions = state.get_i64(revisions_field).unwrap_or(0);
        if revisions >= i64::from(max) {
            debug!(revisions, max, "Revision cap reached, approving");
            return APPROVE_LABEL.to_string();
        }
    }
    match state.get_str(outcome_field) {
        Some(OUTCOME_APPROVED) => APPROVE_LABEL.to_string(),
        Some(OUTCOME_FEEDBACK) => REVISE_LABEL.to_string(),
        // not a branch label, so the run fails with a routing error
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Producer-side memo for reviewed artifacts
///
/// Returns the stored artifact when it is present and no feedback is pending.
/// Otherwise awaits `compute(pending_feedback)`, stores its text in
/// `artifact_field` and clears `feedback_field`.
///
/// ```rust
/// use waypoint_core::RunState;
/// use waypoint_prebuilt::review::produce_with_feedback;
/// use serde_json::json;
///
/// # async fn demo() -> waypoint_core::Result<()> {
/// let state = RunState::new().with("code", "v1").with("code_feedback", "add tests");
/// let update = produce_with_feedback(&state, "code", "code_feedback", |feedback| async move {
///     Ok(format!("v2 ({})", feedback.unwrap_or_default()))
/// })
/// .await?;
/// assert_eq!(update.get("code"), Some(&json!("v2 (add tests)")));
/// assert_eq!(update.get("code_feedback"), Some(&json!(null)));
/// # Ok(())
/// # }
/// ```
pub async fn produce_with_feedback<F, Fut>(
    state: &RunState,
    artifact_field: &str,
    feedback_field: &str,
    compute: F,
) -> Result<PartialUpdate>
where
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let pending = state.get_str(feedback_field).map(str::to_string);
    if pending.is_none() {
        if let Some(stored) = state.get(artifact_field) {
            debug!(field = artifact_field, "Reusing reviewed artifact");
            return Ok(PartialUpdate::new().set(artifact_field, stored.clone()));
        }
    }

    let text = compute(pending).await?;
    Ok(PartialUpdate::new()
        .set(artifact_field, text)
        .set(feedback_field, Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use waypoint_core::{InMemoryCheckpointStore, RunStatus, StepEvent, END};

    fn cycle() -> ReviewCycle {
        ReviewCycle::new("draft", "review_draft", "draft")
            .with_title("Review draft")
            .with_producer("write")
            .approve_to(END)
    }

    fn graph_with(cycle: &ReviewCycle, calls: Arc<AtomicUsize>) -> StateGraph {
        let schema = cycle.extend_schema(StateSchema::new()).unwrap();
        let mut graph = StateGraph::new(schema);
        let (artifact, feedback) = (cycle.artifact_field.clone(), cycle.feedback_field.clone());
        graph
            .add_node("write", move |state: RunState| {
                let calls = calls.clone();
                let (artifact, feedback) = (artifact.clone(), feedback.clone());
                async move {
                    let update = produce_with_feedback(&state, &artifact, &feedback, |fb| async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        Ok(match fb {
                            Some(fb) => format!("v{n} after {fb}"),
                            None => format!("v{n}"),
                        })
                    })
                    .await?;
                    Ok(update.into())
                }
            })
            .unwrap();
        graph.set_entry_point("write");
        cycle.install(&mut graph).unwrap();
        graph
    }

    async fn run_until_pause(app: &waypoint_core::CompiledGraph, run: &mut waypoint_core::Run) -> Option<Value> {
        let mut events = app.stream(run);
        let mut payload = None;
        while let Some(event) = events.next().await {
            if let StepEvent::Interrupt { payload: p, .. } = event.unwrap() {
                payload = Some(p);
            }
        }
        payload
    }

    #[test]
    fn test_extend_schema_is_idempotent() {
        let schema = cycle().extend_schema(StateSchema::new()).unwrap();
        let schema = cycle().extend_schema(schema).unwrap();
        for field in ["draft", "draft_feedback", "draft_outcome", "draft_revisions", REVIEW_LOG] {
            assert!(schema.contains(field), "{field} missing");
        }
    }

    #[test]
    fn test_install_requires_targets() {
        let mut graph = StateGraph::new(StateSchema::new());
        let err = ReviewCycle::new("s", "r", "a").install(&mut graph).unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));

        let err = ReviewCycle::new("s", "r", "a")
            .approve_to(END)
            .install(&mut graph)
            .unwrap_err();
        assert!(err.to_string().contains("revise target"));
    }

    #[tokio::test]
    async fn test_feedback_then_approval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cycle = cycle();
        let app = graph_with(&cycle, calls.clone())
            .compile_with_checkpointer(Arc::new(InMemoryCheckpointStore::new()))
            .unwrap();

        let mut run = app.start("r1", RunState::new()).unwrap();
        let payload = run_until_pause(&app, &mut run).await.unwrap();
        assert_eq!(payload["stage"], "draft");
        assert_eq!(payload["title"], "Review draft");
        assert_eq!(payload["content"], "v1");
        assert_eq!(payload["revision"], 0);

        let mut run = app.resume("r1", "shorter please").await.unwrap();
        let payload = run_until_pause(&app, &mut run).await.unwrap();
        assert_eq!(payload["content"], "v2 after shorter please");
        assert_eq!(payload["revision"], 1);
        assert_eq!(run.state().get("draft_feedback"), None);

        let mut run = app.resume("r1", "approve").await.unwrap();
        assert!(run_until_pause(&app, &mut run).await.is_none());
        assert_eq!(run.status(), RunStatus::Finished);
        assert_eq!(run.state().get_str("draft_outcome"), Some(OUTCOME_APPROVED));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let log = review_log(run.state()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].outcome, OUTCOME_FEEDBACK);
        assert_eq!(log[0].feedback.as_deref(), Some("shorter please"));
        assert_eq!(log[0].revision, 0);
        assert_eq!(log[1].outcome, OUTCOME_APPROVED);
        assert_eq!(log[1].feedback, None);
        assert_eq!(log[1].revision, 1);
        assert!(log[0].at <= log[1].at);
    }

    #[tokio::test]
    async fn test_revision_cap_forces_approval() {
        let cycle = cycle().with_max_revisions(1);
        let app = graph_with(&cycle, Arc::new(AtomicUsize::new(0)))
            .compile_with_checkpointer(Arc::new(InMemoryCheckpointStore::new()))
            .unwrap();

        let mut run = app.start("capped", RunState::new()).unwrap();
        run_until_pause(&app, &mut run).await.unwrap();
        let mut run = app.resume("capped", "try again").await.unwrap();
        assert!(run_until_pause(&app, &mut run).await.is_none());
        assert_eq!(run.status(), RunStatus::Finished);
        assert_eq!(run.state().get_i64("draft_revisions"), Some(1));
    }

    #[tokio::test]
    async fn test_separate_fix_node() {
        let schema = ReviewCycle::new("sec", "security_review", "code")
            .extend_schema(StateSchema::new())
            .unwrap();
        let mut graph = StateGraph::new(schema);
        graph
            .add_node("fix", |state: RunState| async move {
                let update = produce_with_feedback(&state, "code", "sec_feedback", |fb| async move {
                    Ok(format!("patched: {}", fb.unwrap_or_default()))
                })
                .await?;
                Ok(update.into())
            })
            .unwrap();
        graph.set_entry_point("security_review");
        ReviewCycle::new("sec", "security_review", "code")
            .revise_to("fix")
            .approve_to(END)
            .install(&mut graph)
            .unwrap();
        let app = graph
            .compile_with_checkpointer(Arc::new(InMemoryCheckpointStore::new()))
            .unwrap();

        let mut run = app
            .start("fix-1", RunState::new().with("code", "fn main() {}"))
            .unwrap();
        let payload = run_until_pause(&app, &mut run).await.unwrap();
        assert_eq!(payload["content"], "fn main() {}");

        let mut run = app.resume("fix-1", "validate input").await.unwrap();
        let payload = run_until_pause(&app, &mut run).await.unwrap();
        assert_eq!(payload["content"], "patched: validate input");
    }

    #[test]
    fn test_unknown_outcome_is_not_a_branch() {
        let state = RunState::new().with("o", "maybe");
        assert_eq!(route(&state, "o", "n", None), "maybe");
        assert_eq!(route(&RunState::new(), "o", "n", None), "");
        let capped = RunState::new().with("o", OUTCOME_FEEDBACK).with("n", 3);
        assert_eq!(route(&capped, "o", "n", Some(3)), APPROVE_LABEL);
    }
}
