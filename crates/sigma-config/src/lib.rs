#![allow(clippy::must_use_candidate)]

pub mod chat;
pub mod cors;
mod duration;
mod env;
pub mod health;
pub mod imagegen;
mod loader;
pub mod search;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use chat::*;
pub use cors::*;
pub use health::*;
pub use imagegen::*;
pub use search::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level Sigma configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat completion provider configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Web search tool configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Image generation configuration
    #[serde(default)]
    pub imagegen: ImageGenConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
