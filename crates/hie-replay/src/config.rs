use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::filter::{QUESTIONNAIRE_RESPONSE_ROUTES, RecordFilter};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayConfig {
    /// Named SHR targets. Secrets should come from environment overrides.
    #[serde(default)]
    pub environments: Environments,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub replay: ReplaySettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    Dev,
    Prod,
}

impl EnvironmentName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(format!("unknown environment \"{other}\" (expected dev or prod)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Environments {
    #[serde(default)]
    pub dev: Option<EnvironmentConfig>,
    #[serde(default)]
    pub prod: Option<EnvironmentConfig>,
}

impl Environments {
    pub fn get(&self, name: EnvironmentName) -> Option<&EnvironmentConfig> {
        match name {
            EnvironmentName::Dev => self.dev.as_ref(),
            EnvironmentName::Prod => self.prod.as_ref(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (EnvironmentName, &EnvironmentConfig)> {
        [
            (EnvironmentName::Dev, self.dev.as_ref()),
            (EnvironmentName::Prod, self.prod.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, env)| env.map(|e| (name, e)))
    }
}

/// Base URL and basic-auth credentials of one SHR environment.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl EnvironmentConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreSource {
    /// OpenHIM core API (`GET /transactions`).
    #[default]
    Openhim,
    /// Transaction-log export file (JSON array or one document per line).
    File,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub source: StoreSource,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_page_size() -> usize {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            source: StoreSource::default(),
            url: None,
            username: None,
            password: None,
            page_size: default_page_size(),
            path: None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("source", &self.source)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(redact))
            .field("page_size", &self.page_size)
            .field("path", &self.path)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySettings {
    #[serde(default = "default_routes")]
    pub routes: Vec<String>,
    #[serde(default)]
    pub only_failed: bool,
    /// Per-request timeout for SHR calls; unset keeps the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_routes() -> Vec<String> {
    QUESTIONNAIRE_RESPONSE_ROUTES
        .iter()
        .map(|r| (*r).to_string())
        .collect()
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            only_failed: false,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "********" }
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, env) in self.environments.iter() {
            validate_base_url(&format!("environments.{name}.base_url"), &env.base_url)?;
        }
        // Store validations
        if self.store.page_size == 0 {
            return Err("store.page_size must be > 0".into());
        }
        match self.store.source {
            StoreSource::Openhim => match self.store.url.as_deref() {
                None | Some("") => return Err("store.source=openhim requires store.url".into()),
                Some(url) => validate_base_url("store.url", url)?,
            },
            StoreSource::File => {
                if self.store.path.is_none() {
                    return Err("store.source=file requires store.path".into());
                }
            }
        }
        // Replay validations
        if self.replay.routes.is_empty() || self.replay.routes.iter().any(|r| r.is_empty()) {
            return Err("replay.routes must list at least one non-empty path".into());
        }
        if self.replay.timeout_secs == Some(0) {
            return Err("replay.timeout_secs must be > 0 when set".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    /// Resolves the selected SHR environment. Exactly one is used per run.
    pub fn environment(&self, name: EnvironmentName) -> Result<&EnvironmentConfig, ReplayError> {
        self.environments.get(name).ok_or_else(|| {
            ReplayError::Config(format!(
                "environments.{name} is not configured (set it in the config file or via HIE_REPLAY__ENVIRONMENTS__{}__BASE_URL)",
                name.as_str().to_ascii_uppercase()
            ))
        })
    }

    pub fn filter(&self) -> RecordFilter {
        RecordFilter::new(self.replay.routes.clone()).with_only_failed(self.replay.only_failed)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.replay.timeout_secs.map(Duration::from_secs)
    }
}

fn validate_base_url(key: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{key} must not be empty"));
    }
    let url = url::Url::parse(value).map_err(|e| format!("{key} is not a valid URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{key} must use http or https"));
    }
    Ok(())
}

pub mod loader {
    use super::ReplayConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "hie-replay.toml";
    pub const ENV_PREFIX: &str = "HIE_REPLAY";

    pub fn load_config(path: Option<&str>) -> Result<ReplayConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g. HIE_REPLAY__ENVIRONMENTS__PROD__PASSWORD=...
        // Values stay strings so secrets like "007700" survive; numeric fields
        // are converted when the struct is deserialized.
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: ReplayConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
