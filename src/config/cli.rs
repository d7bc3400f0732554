use crate::config::ServiceConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mtg-card-identifier")]
#[command(about = "Identify Magic: The Gathering cards from an uploaded photo")]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(short, long, env = "MTG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl ServeArgs {
    /// 命令列參數優先於檔案與環境變數
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
            tracing::info!("🔧 Host overridden to: {}", host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
            tracing::info!("🔧 Port overridden to: {}", port);
        }
    }
}
