use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory holding the built front end, served with SPA fallback.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static/dist")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session tokens. Sessions issued before a secret
    /// change become invalid.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    // Fall back to the environment, then to a random per-process secret.
    // A random secret invalidates all sessions on restart.
    std::env::var("JWT_SECRET").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string())
}

fn default_session_ttl() -> i64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Generative-language endpoint the relay forwards prompts to.
    #[serde(default = "default_chat_api_url")]
    pub api_url: String,
    #[serde(default = "default_chat_api_key")]
    pub api_key: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: default_chat_api_url(),
            api_key: default_chat_api_key(),
        }
    }
}

fn default_chat_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        .to_string()
}

fn default_chat_api_key() -> String {
    std::env::var("GEMINI_API_KEY").unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            chat: ChatConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.session_ttl_secs, 3600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn auth_section_overrides() {
        let config: Config =
            toml::from_str("[auth]\njwt_secret = \"abc\"\nsession_ttl_secs = 60\n").unwrap();
        assert_eq!(config.auth.jwt_secret, "abc");
        assert_eq!(config.auth.session_ttl_secs, 60);
    }
}
