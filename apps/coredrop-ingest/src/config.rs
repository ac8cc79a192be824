//! Service configuration
//!
//! Values come from the process environment, then from conf files loaded
//! into it with dotenvy (which never overrides a variable already set), then
//! from defaults. Conf files use the dotenv syntax: `KEY=value` lines, `#`
//! comments and optionally quoted values.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Variable naming an explicit conf file; it must exist when set
pub const CONF_VAR: &str = "COREDROP_CONF";
/// Conf file picked up from the working directory when present
pub const DEFAULT_CONF: &str = "coredrop.conf";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Runtime configuration of the ingestion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root of artifacts (`cores/`, `executables/`) and of the `index/`
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
    /// Unread body bytes discarded after a failed upload
    pub drain_limit: Option<u64>,
    /// Largest accepted decompressed header
    pub max_header_size: Option<usize>,
    /// Conf file the values were loaded from, if any
    pub conf_file: Option<PathBuf>,
}

impl Config {
    /// Load conf files into the environment and read the configuration
    pub fn load() -> Result<Self> {
        let conf_file = load_conf_files()?;
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.conf_file = conf_file;
        Ok(config)
    }

    /// Build the configuration from a variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("COREDROP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("COREDROP_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("COREDROP_PORT: invalid port '{}'", raw))?,
            None => 1105,
        };

        let data_dir = lookup("COREDROP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let log_format = match lookup("COREDROP_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("COREDROP_LOG_FORMAT: expected 'text' or 'json', got '{}'", other),
        };

        let drain_limit = lookup("COREDROP_DRAIN_LIMIT")
            .map(|raw| {
                raw.trim()
                    .parse()
                    .with_context(|| format!("COREDROP_DRAIN_LIMIT: invalid byte count '{}'", raw))
            })
            .transpose()?;

        let max_header_size = lookup("COREDROP_MAX_HEADER_SIZE")
            .map(|raw| {
                raw.trim().parse().with_context(|| {
                    format!("COREDROP_MAX_HEADER_SIZE: invalid byte count '{}'", raw)
                })
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            data_dir,
            log_format,
            drain_limit,
            max_header_size,
            conf_file: None,
        })
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }
}

/// Load `.env`, then the conf file, without overriding the environment
///
/// Returns the conf file that was loaded.
fn load_conf_files() -> Result<Option<PathBuf>> {
    dotenvy::dotenv().ok();

    let lookup = |key: &str| std::env::var(key).ok();
    let (path, required) = conf_path(lookup);
    let Some(vars) = conf_vars(&path, required, lookup)? else {
        return Ok(None);
    };

    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    Ok(Some(path))
}

/// Conf file to load, and whether it has to exist
fn conf_path(lookup: impl Fn(&str) -> Option<String>) -> (PathBuf, bool) {
    match lookup(CONF_VAR) {
        Some(path) => (PathBuf::from(path), true),
        None => (PathBuf::from(DEFAULT_CONF), false),
    }
}

/// Variables of the conf file at `path` that `lookup` does not already set
///
/// A missing file is an error when `required`, and `Ok(None)` otherwise.
fn conf_vars(
    path: &Path,
    required: bool,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<Vec<(String, String)>>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(err) if err.not_found() && !required => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("loading configuration file '{}'", path.display()))
        }
    };

    let mut vars = Vec::new();
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("parsing configuration file '{}'", path.display()))?;
        if lookup(&key).is_none() {
            vars.push((key, value));
        }
    }
    Ok(Some(vars))
}
