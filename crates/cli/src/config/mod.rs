use clap::Parser;
use serde::Deserialize;

use crate::{commands::Command, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/ledgerly.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    /// File holding the persisted session.
    pub state_path: String,
    /// Route the user is sent to when the session ends.
    pub login_route: String,
    pub level: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000/api".to_string(),
            state_path: "config/ledgerly_session.json".to_string(),
            login_route: "/login".to_string(),
            level: "info".to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ledgerly", version, about = "Personal finance tracker client")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override API base URL (e.g. http://127.0.0.1:5000/api).
    #[arg(long)]
    api_base: Option<String>,
    /// Override the session file path.
    #[arg(long)]
    state_path: Option<String>,
    /// Override log level.
    #[arg(long)]
    level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

pub fn load() -> Result<(AppConfig, Command)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("LEDGERLY"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    if let Some(state_path) = args.state_path {
        settings.state_path = state_path;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok((settings, args.command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert!(config.api_base.starts_with("http://"));
        assert_eq!(config.login_route, "/login");
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "api_base = \"https://api.example.com\"\nrequest_timeout_secs = 15",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.api_base, "https://api.example.com");
        assert_eq!(settings.request_timeout_secs, Some(15));
        assert_eq!(settings.state_path, "config/ledgerly_session.json");
    }

    #[test]
    fn args_parse_subcommand_and_overrides() {
        let args = Args::try_parse_from([
            "ledgerly",
            "--api-base",
            "http://localhost:9000",
            "transactions",
            "--page",
            "2",
        ])
        .unwrap();
        assert_eq!(args.api_base.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(
            args.command,
            Command::Transactions {
                page: Some(ref page),
                page_size: None
            } if page == "2"
        ));
    }
}
