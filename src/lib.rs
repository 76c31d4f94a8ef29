//! Agrirelay - chat relay and crop advisor backend for a farmer dashboard
//!
//! This library relays chat questions to a local text-generation endpoint,
//! streaming its answer back as plain text, and serves crop predictions
//! backed by an external classifier, and market prices from a government
//! price report.

pub mod cli;
pub mod config;
pub mod crop;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod mandi;
pub mod metrics;
pub mod middleware;
pub mod relay;
pub mod telemetry;
