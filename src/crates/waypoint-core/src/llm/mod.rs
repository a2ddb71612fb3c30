//! Language-model collaborator interface
//!
//! Nodes talk to models through the [`LanguageModel`] trait. The engine never
//! looks at prompts or responses; a node that gets a response without content
//! must fail rather than continue (see [`ModelResponse::into_content`]).
//!
//! Concrete providers live outside this crate. [`ScriptedModel`] is a
//! deterministic stand-in for tests and demos.

mod scripted;
mod traits;

pub use scripted::ScriptedModel;
pub use traits::{LanguageModel, ModelError, ModelResponse};
