//! SDLC Pipeline - model-written artifacts behind human approval gates
//!
//! # Architecture
//!
//! ```text
//! generate_user_stories ──▶ product_owner_review ──approve──▶ create_design_docs
//!          ▲                        │ revise                          │
//!          └────────────────────────┘                                 ▼
//! generate_code ◀──approve── design_review ◀──────────────────────────┘
//!      │   ▲                     │ revise → create_design_docs
//!      ▼   │ revise
//! code_review ──approve──▶ security_review ──approve──▶ write_test_cases
//!                            │       ▲                        │
//!                     revise ▼       │                        ▼
//!                  fix_code_after_security          test_cases_review ──approve──▶ END
//!                                                      │       ▲
//!                                               revise ▼       │
//!                                                   fix_test_cases
//! ```
//!
//! Every reviewer is a [`ReviewCycle`]: it pauses the run with the artifact
//! under review and resumes with `"approve"` or free-text feedback. Producers
//! keep an approved artifact stable and rewrite it only when feedback is
//! pending, so re-entering a stage never calls the model twice for the same
//! input.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waypoint_core::{FileCheckpointStore, ScriptedModel};
//! use waypoint_prebuilt::sdlc::{build_sdlc_graph, initial_state, SdlcConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> waypoint_core::Result<()> {
//! let model = Arc::new(ScriptedModel::from_texts(["stories"]));
//! let store = Arc::new(FileCheckpointStore::open("./runs").await?);
//! let app = build_sdlc_graph(model, SdlcConfig::default())?.compile_with_checkpointer(store)?;
//!
//! let mut run = app.start("todo-app", initial_state("A todo app with reminders"))?;
//! app.step(&mut run).await?; // user stories written
//! app.step(&mut run).await?; // product owner review pending
//! let run = app.resume("todo-app", "approve").await?;
//! # let _ = run;
//! # Ok(())
//! # }
//! ```

use crate::review::{produce_with_feedback, ReviewCycle};
use std::sync::Arc;
use tracing::debug;
use waypoint_core::{
    LanguageModel, NodeOutput, Result, RunState, StateGraph, StateSchema, END,
};

pub const REQUIREMENTS: &str = "requirements";
pub const USER_STORIES: &str = "user_stories";
pub const DESIGN_DOCS: &str = "design_docs";
pub const GENERATED_CODE: &str = "generated_code";
pub const TEST_CASES: &str = "test_cases";
/// Node the pipeline moved to most recently
pub const CURRENT_STEP: &str = "current_step";

pub const PO_FEEDBACK: &str = "po_feedback";
pub const DESIGN_FEEDBACK: &str = "design_feedback";
pub const CODE_FEEDBACK: &str = "code_feedback";
pub const SECURITY_FEEDBACK: &str = "security_feedback";
pub const TEST_FEEDBACK: &str = "test_feedback";

pub const GENERATE_USER_STORIES: &str = "generate_user_stories";
pub const PRODUCT_OWNER_REVIEW: &str = "product_owner_review";
pub const CREATE_DESIGN_DOCS: &str = "create_design_docs";
pub const DESIGN_REVIEW: &str = "design_review";
pub const GENERATE_CODE: &str = "generate_code";
pub const CODE_REVIEW: &str = "code_review";
pub const SECURITY_REVIEW: &str = "security_review";
pub const FIX_CODE_AFTER_SECURITY: &str = "fix_code_after_security";
pub const WRITE_TEST_CASES: &str = "write_test_cases";
pub const TEST_CASES_REVIEW: &str = "test_cases_review";
pub const FIX_TEST_CASES: &str = "fix_test_cases";

/// Pipeline options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdlcConfig {
    /// Approve a stage automatically after this many rounds of feedback
    pub max_revisions: Option<u32>,
}

/// A model-backed node that writes one artifact
struct Producer {
    node: &'static str,
    artifact: &'static str,
    feedback: &'static str,
    next_step: &'static str,
    task: &'static str,
    sources: &'static [(&'static str, &'static str)],
}

const PRODUCERS: &[Producer] = &[
    Producer {
        node: GENERATE_USER_STORIES,
        artifact: USER_STORIES,
        feedback: PO_FEEDBACK,
        next_step: PRODUCT_OWNER_REVIEW,
        task: "Write user stories for the requirements below. Use Markdown and give \
               every story explicit acceptance criteria.",
        sources: &[("Requirements", REQUIREMENTS)],
    },
    Producer {
        node: CREATE_DESIGN_DOCS,
        artifact: DESIGN_DOCS,
        feedback: DESIGN_FEEDBACK,
        next_step: DESIGN_REVIEW,
        task: "Write functional and technical design documents for the user stories \
               below. Draw the architecture as Mermaid diagrams.",
        sources: &[("User stories", USER_STORIES)],
    },
    Producer {
        node: GENERATE_CODE,
        artifact: GENERATED_CODE,
        feedback: CODE_FEEDBACK,
        next_step: CODE_REVIEW,
        task: "Implement the design below as production code with error handling \
               and comments where the logic is not obvious.",
        sources: &[("Design documents", DESIGN_DOCS)],
    },
    Producer {
        node: FIX_CODE_AFTER_SECURITY,
        artifact: GENERATED_CODE,
        feedback: SECURITY_FEEDBACK,
        next_step: SECURITY_REVIEW,
        task: "Fix the security findings in the code below without changing its behavior.",
        sources: &[("Design documents", DESIGN_DOCS)],
    },
    Producer {
        node: WRITE_TEST_CASES,
        artifact: TEST_CASES,
        feedback: TEST_FEEDBACK,
        next_step: TEST_CASES_REVIEW,
        task: "Write test cases for the code below. Cover the acceptance criteria of \
               the user stories and the error paths.",
        sources: &[("User stories", USER_STORIES), ("Code", GENERATED_CODE)],
    },
    Producer {
        node: FIX_TEST_CASES,
        artifact: TEST_CASES,
        feedback: TEST_FEEDBACK,
        next_step: TEST_CASES_REVIEW,
        task: "Revise the test cases below.",
        sources: &[("Code", GENERATED_CODE)],
    },
];

impl Producer {
    fn prompt(&self, state: &RunState, feedback: Option<&str>) -> String {
        let mut prompt = self.task.to_string();
        for (label, field) in self.sources {
            let text = state.get_str(field).unwrap_or("(none)");
            prompt.push_str(&format!("\n\n{}:\n{}", label, text));
        }
        if let Some(feedback) = feedback {
            if let Some(previous) = state.get_str(self.artifact) {
                prompt.push_str(&format!("\n\nPrevious version:\n{}", previous));
            }
            prompt.push_str(&format!("\n\nReviewer feedback to address:\n{}", feedback));
        }
        prompt
    }

    fn install(&'static self, graph: &mut StateGraph, model: Arc<dyn LanguageModel>) -> Result<()> {
        graph.add_node(self.node, move |state: RunState| {
            let model = model.clone();
            async move {
                let update = produce_with_feedback(&state, self.artifact, self.feedback, |pending| {
                    let prompt = self.prompt(&state, pending.as_deref());
                    debug!(node = self.node, revising = pending.is_some(), "Calling model");
                    async move { Ok(model.invoke(&prompt).await?.into_content()?) }
                })
                .await?;
                Ok(NodeOutput::from(update.set(CURRENT_STEP, self.next_step)))
            }
        })?;
        Ok(())
    }
}

/// The five review gates, in pipeline order
pub fn review_cycles(config: SdlcConfig) -> Vec<ReviewCycle> {
    let cycles = vec![
        ReviewCycle::new("user_stories", PRODUCT_OWNER_REVIEW, USER_STORIES)
            .with_title("Product owner review")
            .with_producer(GENERATE_USER_STORIES)
            .with_feedback_field(PO_FEEDBACK)
            .approve_to(CREATE_DESIGN_DOCS),
        ReviewCycle::new("design", DESIGN_REVIEW, DESIGN_DOCS)
            .with_title("Design review")
            .with_producer(CREATE_DESIGN_DOCS)
            .approve_to(GENERATE_CODE),
        ReviewCycle::new("code", CODE_REVIEW, GENERATED_CODE)
            .with_title("Code review")
            .with_producer(GENERATE_CODE)
            .approve_to(SECURITY_REVIEW),
        ReviewCycle::new("security", SECURITY_REVIEW, GENERATED_CODE)
            .with_title("Security review")
            .revise_to(FIX_CODE_AFTER_SECURITY)
            .approve_to(WRITE_TEST_CASES),
        ReviewCycle::new("test_cases", TEST_CASES_REVIEW, TEST_CASES)
            .with_title("Test cases review")
            .with_producer(WRITE_TEST_CASES)
            .with_feedback_field(TEST_FEEDBACK)
            .revise_to(FIX_TEST_CASES)
            .approve_to(END),
    ];
    match config.max_revisions {
        Some(max) => cycles.into_iter().map(|c| c.with_max_revisions(max)).collect(),
        None => cycles,
    }
}

/// Every field the pipeline reads or writes
pub fn sdlc_schema() -> Result<StateSchema> {
    let mut schema = StateSchema::new().text(REQUIREMENTS)?.text(CURRENT_STEP)?;
    for cycle in review_cycles(SdlcConfig::default()) {
        schema = cycle.extend_schema(schema)?;
    }
    Ok(schema)
}

/// Wire the full pipeline; compile it with a checkpoint store to use resume
pub fn build_sdlc_graph(
    model: Arc<dyn LanguageModel>,
    config: SdlcConfig,
) -> Result<StateGraph> {
    let mut graph = StateGraph::new(sdlc_schema()?);
    for producer in PRODUCERS {
        producer.install(&mut graph, model.clone())?;
    }
    for cycle in review_cycles(config) {
        cycle.install(&mut graph)?;
    }
    graph.set_entry_point(GENERATE_USER_STORIES);
    Ok(graph)
}

/// Starting state for `requirements`
pub fn initial_state(requirements: impl Into<String>) -> RunState {
    RunState::new().with(REQUIREMENTS, requirements.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producer(node: &str) -> &'static Producer {
        PRODUCERS.iter().find(|p| p.node == node).unwrap()
    }

    #[test]
    fn test_every_stage_is_wired() {
        let graph = build_sdlc_graph(
            Arc::new(waypoint_core::ScriptedModel::default()),
            SdlcConfig::default(),
        )
        .unwrap()
        .build()
        .unwrap();
        for node in [
            GENERATE_USER_STORIES,
            PRODUCT_OWNER_REVIEW,
            CREATE_DESIGN_DOCS,
            DESIGN_REVIEW,
            GENERATE_CODE,
            CODE_REVIEW,
            SECURITY_REVIEW,
            FIX_CODE_AFTER_SECURITY,
            WRITE_TEST_CASES,
            TEST_CASES_REVIEW,
            FIX_TEST_CASES,
        ] {
            assert!(graph.contains(node), "{node} missing");
        }
        assert_eq!(graph.entry(), GENERATE_USER_STORIES);
    }

    #[test]
    fn test_prompt_carries_sources_and_feedback() {
        let state = initial_state("A todo app").with(USER_STORIES, "As a user...");
        let first = producer(GENERATE_USER_STORIES).prompt(&state, None);
        assert!(first.contains("Requirements:\nA todo app"));
        assert!(!first.contains("Previous version"));

        let revised = producer(GENERATE_USER_STORIES).prompt(&state, Some("split story 2"));
        assert!(revised.contains("Previous version:\nAs a user..."));
        assert!(revised.ends_with("Reviewer feedback to address:\nsplit story 2"));

        let design = producer(CREATE_DESIGN_DOCS).prompt(&RunState::new(), None);
        assert!(design.contains("User stories:\n(none)"));
    }

    #[test]
    fn test_max_revisions_applies_to_every_gate() {
        let cycles = review_cycles(SdlcConfig {
            max_revisions: Some(2),
        });
        assert_eq!(cycles.len(), 5);
        assert!(cycles.iter().all(|c| c.max_revisions == Some(2)));
    }
}
