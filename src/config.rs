use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::constants::{DEFAULT_MESSAGE, DEFAULT_QUERY, QUERY_DATE_FORMAT};
use crate::error::ConfigError;

/// Optional defaults read from `config.toml`. Command line flags win.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub prompt: Option<bool>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("autoreply");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file. A missing default file yields empty defaults;
    /// an explicitly requested file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path()?;
                if !path.exists() {
                    tracing::debug!("No config file at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse(&content, &path)?)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// A search expression plus optional date bounds.
///
/// Rendering never changes the base expression; bounds are appended as
/// `after:` / `before:` terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    base: String,
    after: Option<NaiveDate>,
    before: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            after: None,
            before: None,
        }
    }

    pub fn after(self, date: Option<NaiveDate>) -> Self {
        Self { after: date, ..self }
    }

    pub fn before(self, date: Option<NaiveDate>) -> Self {
        Self { before: date, ..self }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(date) = self.after {
            write!(f, " after:{}", date.format(QUERY_DATE_FORMAT))?;
        }
        if let Some(date) = self.before {
            write!(f, " before:{}", date.format(QUERY_DATE_FORMAT))?;
        }
        Ok(())
    }
}

/// Settings for one run, fixed before any request is made.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub query: SearchQuery,
    pub message: String,
    pub prompt: bool,
}

impl RunSettings {
    pub fn resolve(args: &Args, config: &Config) -> Result<Self, ConfigError> {
        let message = args
            .message
            .clone()
            .or_else(|| config.message.clone())
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
        if message.is_empty() {
            return Err(ConfigError::MissingRequired("message"));
        }

        let base = args
            .query
            .clone()
            .or_else(|| config.query.clone())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        let query = SearchQuery::new(base)
            .after(parse_date("--start-date", args.start_date.as_deref())?)
            .before(parse_date("--end-date", args.end_date.as_deref())?);

        Ok(Self {
            query,
            message,
            prompt: args.prompt.or(config.prompt).unwrap_or(true),
        })
    }
}

/// Parse an optional YYYY/MM/DD bound. Empty strings mean "no bound".
fn parse_date(flag: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, QUERY_DATE_FORMAT)
            .map(Some)
            .map_err(|_| ConfigError::InvalidDate {
                flag,
                value: value.to_string(),
            }),
    }
}
