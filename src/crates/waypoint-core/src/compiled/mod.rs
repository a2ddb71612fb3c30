//! Compiled graph and its execution engine
//!
//! - `graph` - [`CompiledGraph`] and its builder methods
//! - `run` - the [`Run`] record a caller drives
//! - `execution` - `start`, `step`, `invoke`
//! - `streaming` - the lazy `stream` of step events
//! - `state` - checkpoint-backed `resume`, `load_run`, `delete_run`

mod execution;
mod graph;
mod run;
mod state;
mod streaming;

pub use graph::CompiledGraph;
pub use run::Run;
