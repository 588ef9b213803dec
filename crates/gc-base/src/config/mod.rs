//! Startup configuration.
//!
//! Built once in `main` and passed by reference into every component.
//! Layers, lowest precedence first: built-in defaults, `config.yaml` in the
//! platform config directory, `.env`, process environment.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use secrecy::SecretBox;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{
    APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, CONFIG_FILE_NAME, DEFAULT_AUTH_TIMEOUT_SECS,
    DEFAULT_GIT_TIMEOUT_SECS, DEFAULT_GITHUB_API_URL, DEFAULT_LOG_FILE, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REPO_NAME,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Invalid config file {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml::Error },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Optional on-disk configuration. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
    pub redirect_uri: Option<String>,
    pub github_api_url: Option<String>,
    pub repo_name: Option<String>,
    pub log_file: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub working_tree: Option<PathBuf>,
    pub git_timeout_secs: Option<u64>,
    pub auth_timeout_secs: Option<u64>,
}

/// OAuth application settings. Only needed by `login`.
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretBox<String>,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub timeout_secs: u64,
}

pub struct Config {
    pub oauth: Option<OAuthConfig>,
    pub github_api_url: String,
    pub repo_name: String,
    pub log_file: String,
    pub poll_interval_secs: u64,
    pub working_tree: PathBuf,
    pub git_timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from disk and the process environment. `.env` is
    /// loaded once by the binary before logging starts.
    pub fn load() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME);
        let file = match dirs.as_ref() {
            Some(d) => read_file_config(&d.config_dir().join(CONFIG_FILE_NAME))?,
            None => None,
        };
        let data_dir =
            dirs.map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".gitclock"));

        Self::from_sources(file.unwrap_or_default(), |key| std::env::var(key).ok(), data_dir)
    }

    /// Merge a file config with an environment lookup. Environment wins.
    pub fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        data_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let pick = |key: &str, from_file: Option<String>| env(key).filter(|v| !v.is_empty()).or(from_file);

        let poll_interval_secs = parse_u64(&env, "GITCLOCK_POLL_SECS")?
            .or(file.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid { key: "GITCLOCK_POLL_SECS", reason: "must be greater than zero".into() });
        }

        let git_timeout_secs =
            parse_u64(&env, "GITCLOCK_GIT_TIMEOUT_SECS")?.or(file.git_timeout_secs).unwrap_or(DEFAULT_GIT_TIMEOUT_SECS);
        let auth_timeout_secs = parse_u64(&env, "GITCLOCK_AUTH_TIMEOUT_SECS")?
            .or(file.auth_timeout_secs)
            .unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS);

        let repo_name = pick("REPO_NAME", file.repo_name).unwrap_or_else(|| DEFAULT_REPO_NAME.to_string());
        if repo_name.trim().is_empty() {
            return Err(ConfigError::Invalid { key: "REPO_NAME", reason: "must not be empty".into() });
        }

        let log_file = pick("GITCLOCK_LOG_FILE", file.log_file).unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let log_file = log_file.trim_start_matches('/').to_string();
        if log_file.is_empty() {
            return Err(ConfigError::Invalid { key: "GITCLOCK_LOG_FILE", reason: "must not be empty".into() });
        }

        let github_api_url = pick("GITHUB_API_URL", file.github_api_url)
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let working_tree = env("GITCLOCK_WORKING_TREE")
            .map(PathBuf::from)
            .or(file.working_tree)
            .unwrap_or_else(|| PathBuf::from("."));

        // OAuth settings come as a group; a partial group is left unset and
        // reported when `login` asks for it.
        let oauth = match (
            pick("CLIENT_ID", file.client_id),
            pick("CLIENT_SECRET", file.client_secret),
            pick("AUTH_URL", file.auth_url),
            pick("TOKEN_URL", file.token_url),
            pick("REDIRECT_URI", file.redirect_uri),
        ) {
            (Some(client_id), Some(secret), Some(auth_url), Some(token_url), Some(redirect_uri)) => Some(OAuthConfig {
                client_id,
                client_secret: SecretBox::new(Box::new(secret)),
                auth_url,
                token_url,
                redirect_uri,
                timeout_secs: auth_timeout_secs,
            }),
            _ => None,
        };

        Ok(Self {
            oauth,
            github_api_url,
            repo_name,
            log_file,
            poll_interval_secs,
            working_tree,
            git_timeout_secs,
            data_dir,
        })
    }

    /// OAuth settings, or the first missing key.
    pub fn oauth(&self) -> Result<&OAuthConfig, ConfigError> {
        self.oauth
            .as_ref()
            .ok_or(ConfigError::Missing("CLIENT_ID, CLIENT_SECRET, AUTH_URL, TOKEN_URL or REDIRECT_URI"))
    }
}

fn read_file_config(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let parsed = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })?;
    info!("Loaded config from {}", path.display());
    Ok(Some(parsed))
}

fn parse_u64(env: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env(key) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid { key, reason: format!("{:?}: {}", v, e) }),
    }
}

#[cfg(test)]
mod tests;
