//! Shared LLM access for the driving-rules assistant.
//!
//! - [`service_profiles::LlmServiceProfiles`]: chat + embedding profiles with cached clients
//! - [`config`]: model configs and env-driven defaults
//! - [`error_handler`]: unified [`AiLlmError`]
//! - [`telemetry`]: tracing layer and filter helpers

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use error_handler::AiLlmError;
pub use service_profiles::LlmServiceProfiles;
