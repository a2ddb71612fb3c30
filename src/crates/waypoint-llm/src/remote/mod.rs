//! Remote provider implementations.
//!
//! # Providers
//!
//! - **Groq** - Groq-hosted models through the OpenAI-compatible chat API

pub mod groq;

pub use groq::GroqClient;
