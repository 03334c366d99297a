use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Sigma AI chat backend
#[derive(Debug, Parser)]
#[command(name = "sigma", about = "Streaming chat and image generation backend for the Sigma UI")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sigma.toml", env = "SIGMA_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "SIGMA_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directives, e.g. `info,sigma_llm=debug`
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log: String,
}
