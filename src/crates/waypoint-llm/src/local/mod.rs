//! Offline providers.
//!
//! These run in-process, need no API key or network, and answer
//! deterministically, which makes them suitable for demos and dry runs of a
//! pipeline's control flow.
//!
//! # Providers
//!
//! - **Echo** - repeats the prompt head or the last user message

pub mod echo;

pub use echo::EchoModel;
