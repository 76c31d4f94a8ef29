//! Client for the text-generation upstream
//!
//! The upstream speaks the `/api/generate` protocol: a JSON request with
//! `{model, prompt, system, stream}` answered either by a single JSON object
//! or, when streaming, by newline-delimited JSON objects.

pub mod client;
pub mod types;

pub use client::GenerationClient;
pub use types::{GenerateChunk, GenerateRequest, GenerateResponse};
