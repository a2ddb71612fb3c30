//! Providers plugged into graph nodes

use std::sync::Arc;
use waypoint_core::{LanguageModel, PartialUpdate, RunState, StateGraph, StateSchema, END};
use waypoint_llm::EchoModel;

#[tokio::test]
async fn test_echo_model_drives_a_node() {
    let model: Arc<dyn LanguageModel> = Arc::new(EchoModel::new());
    let schema = StateSchema::new()
        .text("requirements")
        .unwrap()
        .text("stories")
        .unwrap();
    let mut graph = StateGraph::new(schema);
    graph
        .add_node("generate_user_stories", move |state: RunState| {
            let model = model.clone();
            async move {
                let requirements = state.get_str("requirements").unwrap_or_default();
                let prompt = format!("{}\nWrite user stories.", requirements);
                let stories = model.invoke(&prompt).await?.into_content()?;
                Ok(PartialUpdate::new().set("stories", stories).into())
            }
        })
        .unwrap()
        .add_edge("generate_user_stories", END)
        .unwrap();
    graph.set_entry_point("generate_user_stories");

    let state = graph
        .compile()
        .unwrap()
        .invoke("echo", RunState::new().with("requirements", "A todo app"))
        .await
        .unwrap();
    assert_eq!(state.get_str("stories"), Some("echo: A todo app"));
}
