use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::{ShVersion, Threshold};
use crate::error::ShError;
use crate::plutof::DEFAULT_API_URL;

pub const CONFIG_FILE_NAME: &str = "sh-resolve.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub threshold: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
}

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub threshold: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub threshold: Threshold,
    pub version: ShVersion,
    pub timeout: Duration,
    pub max_retries: usize,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>, overrides: Overrides) -> Result<Settings, ShError> {
        let config = match path {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => match Self::discover() {
                Some(found) => Self::load(found)?,
                None => Config::default(),
            },
        };
        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(config: Config, overrides: Overrides) -> Result<Settings, ShError> {
        let threshold = match overrides.threshold.or(config.threshold) {
            Some(value) => value.parse()?,
            None => Threshold::default(),
        };
        let version = match overrides.version.or(config.version) {
            Some(value) => value.parse()?,
            None => ShVersion::default(),
        };
        Ok(Settings {
            api_url: config
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            threshold,
            version,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(30)),
            max_retries: config.max_retries.unwrap_or(3),
        })
    }

    fn load(config_path: PathBuf) -> Result<Config, ShError> {
        let content = fs::read_to_string(&config_path)
            .map_err(|_| ShError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| ShError::ConfigParse(err.to_string()))
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("ee", "plutof", "unite-sh")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }
}
