//! End-to-end approval pipeline
//!
//! A model-backed producer feeds a human review gate; the run is suspended and
//! resumed through a file-backed checkpoint store, with a fresh graph instance
//! for every resume.

use futures::StreamExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use waypoint_core::memo::memoize;
use waypoint_core::{
    CompiledGraph, Decision, FileCheckpointStore, GraphError, LanguageModel, NodeOutput,
    PartialUpdate, RunState, RunStatus, ScriptedModel, StateGraph, StateSchema, StepEvent, END,
};

fn build(model: Arc<ScriptedModel>) -> StateGraph {
    let schema = StateSchema::new()
        .text("topic")
        .unwrap()
        .text("draft")
        .unwrap()
        .text("feedback")
        .unwrap()
        .text("summary")
        .unwrap()
        .sequence("history")
        .unwrap();
    let mut graph = StateGraph::new(schema);

    let drafter = model.clone();
    graph
        .add_node("draft", move |state: RunState| {
            let model = drafter.clone();
            async move {
                let topic = state.get_str("topic").unwrap_or_default().to_string();
                let prompt = match state.get_str("feedback") {
                    Some(feedback) => format!("Rewrite the post about {topic}. Feedback: {feedback}"),
                    None => format!("Write a post about {topic}"),
                };
                let draft = model.invoke(&prompt).await?.into_content()?;
                Ok(PartialUpdate::new()
                    .set("draft", draft.clone())
                    .set("feedback", Value::Null)
                    .set("history", json!({"draft": draft}))
                    .into())
            }
        })
        .unwrap()
        .add_node("review", |state: RunState| async move {
            Ok(match Decision::from_state(&state) {
                None => NodeOutput::interrupt(json!({
                    "title": "Review draft",
                    "draft": state.get_str("draft"),
                })),
                Some(Decision::Approve) => PartialUpdate::new()
                    .set("history", json!({"review": "approved"}))
                    .into(),
                Some(Decision::Feedback(text)) => PartialUpdate::new()
                    .set("history", json!({"review": text}))
                    .set("feedback", text)
                    .into(),
            })
        })
        .unwrap();

    let summarizer = model;
    graph
        .add_node("summarize", move |state: RunState| {
            let model = summarizer.clone();
            async move {
                let draft = state.get_str("draft").unwrap_or_default().to_string();
                memoize(&state, "summary", || async move {
                    let summary = model.invoke(&format!("Summarize: {draft}")).await?;
                    Ok(Value::String(summary.into_content()?))
                })
                .await
                .map(NodeOutput::from)
            }
        })
        .unwrap()
        .add_edge("draft", "review")
        .unwrap()
        .add_conditional_edge(
            "review",
            |state: &RunState| {
                if state.is_present("feedback") {
                    "revise".to_string()
                } else {
                    "approve".to_string()
                }
            },
            [("revise", "draft"), ("approve", "summarize")],
        )
        .unwrap()
        .add_edge("summarize", END)
        .unwrap();
    graph.set_entry_point("draft");
    graph
}

async fn open(dir: &Path, model: Arc<ScriptedModel>) -> CompiledGraph {
    let store = FileCheckpointStore::open(dir).await.unwrap();
    build(model).compile_with_checkpointer(Arc::new(store)).unwrap()
}

async fn drive(app: &CompiledGraph, run: &mut waypoint_core::Run) -> Vec<StepEvent> {
    let mut events = Vec::new();
    let mut stream = app.stream(run);
    while let Some(event) = stream.next().await {
        events.push(event.unwrap());
    }
    events
}

#[tokio::test]
async fn test_reject_then_approve() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedModel::from_texts([
        "Rust is fast",
        "Rust is fast and safe",
        "A post on Rust",
    ]));

    let app = open(dir.path(), model.clone()).await;
    let mut run = app
        .start("post-1", RunState::new().with("topic", "Rust"))
        .unwrap();
    let events = drive(&app, &mut run).await;
    let interrupts: Vec<_> = events.iter().filter(|e| e.is_interrupt()).collect();
    assert_eq!(interrupts.len(), 1);
    assert_eq!(interrupts[0].payload().unwrap()["draft"], "Rust is fast");
    drop(app);

    // first decision: send it back with feedback
    let app = open(dir.path(), model.clone()).await;
    let mut run = app.resume("post-1", "mention memory safety").await.unwrap();
    let events = drive(&app, &mut run).await;
    assert_eq!(
        events.iter().map(StepEvent::node).collect::<Vec<_>>(),
        vec!["review", "draft", "review"]
    );
    assert_eq!(
        events.last().unwrap().payload().unwrap()["draft"],
        "Rust is fast and safe"
    );
    assert_eq!(run.status(), RunStatus::Suspended);
    drop(app);

    // second decision: approve
    let app = open(dir.path(), model.clone()).await;
    let mut run = app.resume("post-1", json!({"approved": true})).await.unwrap();
    let events = drive(&app, &mut run).await;
    assert_eq!(
        events.iter().map(StepEvent::node).collect::<Vec<_>>(),
        vec!["review", "summarize"]
    );
    assert_eq!(run.status(), RunStatus::Finished);

    let state = run.state();
    assert_eq!(state.get_str("draft"), Some("Rust is fast and safe"));
    assert_eq!(state.get_str("summary"), Some("A post on Rust"));
    assert!(!state.is_present("feedback"));
    assert_eq!(
        state.get_array("history").unwrap(),
        &[
            json!({"draft": "Rust is fast"}),
            json!({"review": "mention memory safety"}),
            json!({"draft": "Rust is fast and safe"}),
            json!({"review": "approved"}),
        ]
    );

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[0], "Write a post about Rust");
    assert!(prompts[1].contains("Feedback: mention memory safety"));
    assert_eq!(model.remaining(), 0);

    let stored = app.load_run("post-1").await.unwrap();
    assert_eq!(stored.status(), RunStatus::Finished);
}

#[tokio::test]
async fn test_resuming_finished_run_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedModel::from_texts(["draft", "summary"]));
    let app = open(dir.path(), model).await;

    let mut run = app.start("post-2", RunState::new().with("topic", "x")).unwrap();
    drive(&app, &mut run).await;
    let mut run = app.resume("post-2", "approve").await.unwrap();
    drive(&app, &mut run).await;

    let err = app.resume("post-2", "approve").await.unwrap_err();
    assert!(matches!(err, GraphError::InvalidResume { .. }));
}

#[tokio::test]
async fn test_model_failure_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedModel::from_texts(Vec::<String>::new()));
    let app = open(dir.path(), model).await;

    let mut run = app.start("post-3", RunState::new().with("topic", "x")).unwrap();
    let mut stream = app.stream(&mut run);
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(stream.next().await.is_none());
    drop(stream);

    assert!(err.to_string().starts_with("Node 'draft' execution failed"));
    assert_eq!(run.status(), RunStatus::Failed);
    assert_eq!(
        app.load_run("post-3").await.unwrap().status(),
        RunStatus::Failed
    );
}
