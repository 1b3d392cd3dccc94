use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::ServerRecord;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub music: MusicConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// The selected server; empty host means discovery has not run yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Play from the source's filesystem path instead of a server stream.
    #[serde(default)]
    pub direct_paths: bool,

    /// Seconds subtracted from a saved position before resuming.
    #[serde(default = "default_jump_back")]
    pub jump_back_secs: u32,

    /// Play server-selected intros before movies.
    #[serde(default = "default_true")]
    pub cinema_mode: bool,

    /// Whether the first-run playback-mode question has been asked.
    #[serde(default)]
    pub prompted_direct_paths: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub direct_stream: bool,

    #[serde(default)]
    pub prompted: bool,
}

/// Opt-in directory-service (remote access) settings. The token itself is
/// kept in the credential store, never in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    /// Network share registered for native-path playback, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_path: Option<String>,

    #[serde(default)]
    pub prompted_credentials: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = fs::read_to_string(path).context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// The configured server, or `None` until discovery has selected one.
    pub fn server_record(&self) -> Option<ServerRecord> {
        if self.server.host.is_empty() {
            return None;
        }
        Some(ServerRecord {
            id: self.server.id.clone().unwrap_or_default(),
            name: self.server.name.clone(),
            scheme: self.server.scheme.clone(),
            host: self.server.host.clone(),
            port: self.server.port,
            access_token: self.server.access_token.clone(),
        })
    }

    pub fn set_server(&mut self, record: &ServerRecord) {
        self.server.id = Some(record.id.clone());
        self.server.name = record.name.clone();
        self.server.scheme = record.scheme.clone();
        self.server.host = record.host.clone();
        self.server.port = record.port;
        self.server.access_token = record.access_token.clone();
    }

    pub fn set_user(&mut self, user_id: &str, username: &str) {
        self.user.user_id = Some(user_id.to_string());
        self.user.username = Some(username.to_string());
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("embylink").join("config.toml"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            scheme: default_scheme(),
            host: String::new(),
            port: default_port(),
            access_token: None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            direct_paths: false,
            jump_back_secs: default_jump_back(),
            cinema_mode: default_true(),
            prompted_direct_paths: false,
        }
    }
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            direct_stream: false,
            prompted: false,
        }
    }
}

// Default value functions
fn default_scheme() -> String {
    "http".to_string()
}
fn default_port() -> u16 {
    8096
}
fn default_jump_back() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
