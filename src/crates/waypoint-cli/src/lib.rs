//! # waypoint-cli
//!
//! Library half of the `waypoint` binary: layered TOML configuration, tracing
//! setup and one handler per subcommand.
//!
//! ```text
//! waypoint run --requirements "A todo app"      start the SDLC pipeline
//! waypoint resume --run-id <id> --decision ...  answer a review gate
//! waypoint show | list | delete                 inspect stored runs
//! waypoint graph --pipeline sdlc                print Mermaid
//! waypoint chat --run-id <id> --message ...     one chat turn
//! ```

pub mod cli;
pub mod config;
pub mod logging;

pub use cli::{CliContext, Pipeline};
pub use config::{ConfigLoader, WaypointConfig};
