//! judgeprobe - judge-model endpoint discovery for OpenAI-compatible gateways
//!
//! This library finds which (API version, model id) combinations an
//! OpenAI-compatible gateway actually serves, registers judge models under
//! public names for an evaluation harness, and supervises a local
//! model-serving process until it is ready.

pub mod cli;
pub mod config;
pub mod error;
pub mod judge;
pub mod metrics;
pub mod probe;
pub mod registry;
pub mod server;
pub mod telemetry;
