//! LLM-backed mutation proposer.
//!
//! Sends the current best source to an OpenAI-compatible chat-completions
//! endpoint and returns the cleaned reply as the next candidate.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod prompt;
pub mod client;

pub use prompt::{build_prompt, clean_code};
pub use client::LlmMutator;
