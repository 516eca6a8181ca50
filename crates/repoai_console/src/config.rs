use std::path::Path;
use std::time::Duration;

use repoai_api::DEFAULT_BASE_URL;
use repoai_session::DEFAULT_WORKING_DIRECTORY;
use serde::Deserialize;

pub const CONFIG_PATH_ENV_VAR: &str = "REPOAI_CONFIG_PATH";
pub const BASE_URL_ENV_VAR: &str = "REPOAI_BASE_URL";
pub const WORKSPACE_ENV_VAR: &str = "REPOAI_WORKSPACE";

/// Resolved console settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub workspace: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            workspace: DEFAULT_WORKING_DIRECTORY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    timeout_sec: Option<u64>,
    workspace: Option<String>,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable source: file first, then overrides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = match get(CONFIG_PATH_ENV_VAR) {
            Some(path) => Self::load_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(base_url) = get(BASE_URL_ENV_VAR) {
            config.base_url = base_url;
        }
        if let Some(workspace) = get(WORKSPACE_ENV_VAR) {
            config.workspace = workspace;
        }

        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            format!(
                "Failed to read {CONFIG_PATH_ENV_VAR} at {}: {error}",
                path.display()
            )
        })?;
        Self::parse(&raw).map_err(|error| format!("Invalid config at {}: {error}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let file: ConfigFile = serde_json::from_str(raw).map_err(|error| error.to_string())?;
        let defaults = Self::default();

        let timeout = match file.timeout_sec {
            Some(0) => return Err("timeout_sec must be > 0".to_string()),
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        Ok(Self {
            base_url: non_empty(file.base_url).unwrap_or(defaults.base_url),
            timeout,
            workspace: non_empty(file.workspace).unwrap_or(defaults.workspace),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
