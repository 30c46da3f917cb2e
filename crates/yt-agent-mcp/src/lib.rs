use std::{
    path::{Path, PathBuf},
    time::Duration as StdDuration,
};

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use time::Duration;
use yt_agent_client::ClientConfig;
use yt_agent_core::{run, state::DialogueSettings, ServerConfig, ServerMode};

pub const ENV_PREFIX: &str = "YT_AGENT";
const SETTINGS_FILE: &str = "settings.toml";

/// Effective settings after layering defaults, the settings file and
/// `YT_AGENT_*` environment variables (later layers win).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub session_capacity: usize,
    pub search_page_size: u32,
    pub trending_page_size: u32,
    pub channel_page_size: u32,
    pub headless: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let client = ClientConfig::default();
        let dialogue = DialogueSettings::default();
        Self {
            backend_url: client.base_url,
            request_timeout_secs: client.timeout.as_secs(),
            session_ttl_secs: 30 * 60,
            session_capacity: 1024,
            search_page_size: dialogue.search_page_size,
            trending_page_size: dialogue.trending_page_size,
            channel_page_size: dialogue.channel_page_size,
            headless: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.backend_url.trim().is_empty(), "backend_url must not be empty");
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        ensure!(self.session_ttl_secs > 0, "session_ttl_secs must be positive");
        ensure!(self.session_capacity > 0, "session_capacity must be positive");
        ensure!(
            self.search_page_size > 0 && self.trending_page_size > 0 && self.channel_page_size > 0,
            "page sizes must be positive"
        );
        Ok(())
    }

    pub fn server_config(&self) -> Result<ServerConfig> {
        self.validate()?;
        let ttl_secs =
            i64::try_from(self.session_ttl_secs).context("session_ttl_secs is out of range")?;
        Ok(ServerConfig {
            client: ClientConfig {
                base_url: self.backend_url.clone(),
                timeout: StdDuration::from_secs(self.request_timeout_secs),
                ..ClientConfig::default()
            },
            session_ttl: Duration::seconds(ttl_secs),
            session_capacity: self.session_capacity,
            dialogue: DialogueSettings {
                search_page_size: self.search_page_size,
                trending_page_size: self.trending_page_size,
                channel_page_size: self.channel_page_size,
            },
            mode: if self.headless {
                ServerMode::Headless
            } else {
                ServerMode::Stdio
            },
            ..ServerConfig::default()
        })
    }
}

/// Platform config location, e.g. `~/.config/yt-agent/settings.toml`.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "YtAgent", "yt-agent")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

/// Loads settings from `path` (required when given) or the platform default
/// (optional), then the process environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    build_settings(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
}

/// Like [`load_settings`] but reads environment overrides from `env`
/// instead of the process environment.
pub fn load_settings_with_env(
    path: Option<&Path>,
    env: config::Map<String, String>,
) -> Result<Settings> {
    build_settings(
        path,
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(env)),
    )
}

fn build_settings(path: Option<&Path>, environment: Environment) -> Result<Settings> {
    let mut builder = Config::builder();
    match path {
        Some(path) => {
            builder = builder.add_source(File::from(path).required(true));
        }
        None => {
            if let Some(default_path) = default_settings_path() {
                builder = builder.add_source(File::from(default_path).required(false));
            }
        }
    }

    let settings: Settings = builder
        .add_source(environment)
        .build()
        .context("failed to read settings")?
        .try_deserialize()
        .context("invalid settings")?;
    settings.validate()?;
    Ok(settings)
}

pub fn resolve_server_config(path: Option<&Path>) -> Result<ServerConfig> {
    load_settings(path)?.server_config()
}

/// Launches the stdio server with layered settings.
pub async fn run_server(path: Option<&Path>) -> Result<()> {
    run_with_settings(&load_settings(path)?).await
}

pub async fn run_with_settings(settings: &Settings) -> Result<()> {
    let config = settings.server_config()?;
    tracing::info!(
        target: "yt_agent_mcp",
        backend = %config.client.base_url,
        mode = ?config.mode,
        "Starting conversational server"
    );
    run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_runtime_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, "http://127.0.0.1:8000");
        assert_eq!(settings.request_timeout_secs, 15);
        assert_eq!(settings.session_ttl_secs, 1800);
        assert_eq!(settings.trending_page_size, 12);
        let config = settings.server_config().expect("valid");
        assert_eq!(config.mode, ServerMode::Stdio);
        assert_eq!(config.session_ttl, Duration::minutes(30));
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = load_settings_with_env(
            None,
            env(&[
                ("YT_AGENT_BACKEND_URL", "http://backend:9000"),
                ("YT_AGENT_SEARCH_PAGE_SIZE", "25"),
                ("YT_AGENT_HEADLESS", "true"),
            ]),
        )
        .expect("settings load");
        assert_eq!(settings.backend_url, "http://backend:9000");
        assert_eq!(settings.search_page_size, 25);
        assert!(settings.headless);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result =
            load_settings_with_env(None, env(&[("YT_AGENT_SESSION_CAPACITY", "0")]));
        assert!(result.is_err());
    }
}
