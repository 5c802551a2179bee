//! Credential loading from the process environment and `.env` files.

use std::{
    env,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::error::ConfigError;

/// Theater whose calendar is scraped.
pub const THEATER_NAME: &str = "Metrograph";
/// Calendar page fetched on every run.
pub const CALENDAR_URL: &str = "https://metrograph.com/calendar";

const FIRECRAWL_KEYS: &[&str] = &["FIRECRAWL_API_KEY", "EXPO_PUBLIC_FIRECRAWL_API_KEY"];
const OPENAI_KEYS: &[&str] = &["OPENAI_API_KEY", "EXPO_PUBLIC_OPENAI_API_KEY"];

/// The two credentials a run needs.
#[derive(Clone)]
pub struct Config {
    pub firecrawl_api_key: String,
    pub openai_api_key: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("firecrawl_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load `.env` (current directory first, then its parent) and read both
    /// credentials from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let cwd = env::current_dir().ok();
        match cwd.as_deref().and_then(find_env_file) {
            Some(path) => {
                info!("Loading environment from {}", path.display());
                dotenvy::from_path(&path).map_err(|source| ConfigError::EnvFile {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            None => warn!("No .env file found, relying on the process environment"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve both credentials through `lookup`. Each has a fallback
    /// variable name; unset and empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            firecrawl_api_key: resolve(&lookup, FIRECRAWL_KEYS)?,
            openai_api_key: resolve(&lookup, OPENAI_KEYS)?,
        })
    }
}

fn resolve<F>(lookup: &F, keys: &'static [&'static str]) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (i, key) in keys.iter().enumerate() {
        if let Some(value) = lookup(*key).filter(|v| !v.trim().is_empty()) {
            if i > 0 {
                warn!("{} not found, using {} instead", keys[0], key);
            }
            return Ok(value);
        }
    }
    Err(ConfigError::MissingCredential {
        tried: keys.to_vec(),
    })
}

fn find_env_file(dir: &Path) -> Option<PathBuf> {
    let here = dir.join(".env");
    if here.is_file() {
        return Some(here);
    }
    dir.parent()
        .map(|parent| parent.join(".env"))
        .filter(|path| path.is_file())
}
