//! Runtime configuration for the service root.
//!
//! # Responsibility
//! - Provide defaults for file locations, logging and session timeout.
//! - Load an optional JSON config file and apply `FOLIO_*` env overrides.
//!
//! # Invariants
//! - A returned config has passed `validate()`.
//! - Env overrides always win over file values.

use crate::auth::credentials::CredentialPolicy;
use crate::auth::session::DEFAULT_SESSION_TIMEOUT_SECS;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DATA_FILE: &str = "FOLIO_DATA_FILE";
pub const ENV_USERS_FILE: &str = "FOLIO_USERS_FILE";
pub const ENV_LOG_DIR: &str = "FOLIO_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "FOLIO_LOG_LEVEL";
pub const ENV_SESSION_TIMEOUT_SECS: &str = "FOLIO_SESSION_TIMEOUT_SECS";
pub const ENV_CREDENTIAL_POLICY: &str = "FOLIO_CREDENTIAL_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Article collection snapshot.
    pub data_file: PathBuf,
    /// User directory snapshot.
    pub users_file: PathBuf,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub session_timeout_secs: i64,
    pub credential_policy: CredentialPolicy,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data.json"),
            users_file: PathBuf::from("users.json"),
            log_dir: None,
            log_level: None,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            credential_policy: CredentialPolicy::default(),
        }
    }
}

impl FolioConfig {
    /// Loads defaults, then `path` when given, then process env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `FOLIO_*` overrides from `vars`; other keys are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_DATA_FILE => self.data_file = PathBuf::from(value),
                ENV_USERS_FILE => self.users_file = PathBuf::from(value),
                ENV_LOG_DIR => self.log_dir = Some(PathBuf::from(value)),
                ENV_LOG_LEVEL => self.log_level = Some(value),
                ENV_SESSION_TIMEOUT_SECS => {
                    self.session_timeout_secs =
                        value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                            key: ENV_SESSION_TIMEOUT_SECS,
                            value: value.clone(),
                        })?;
                }
                ENV_CREDENTIAL_POLICY => {
                    self.credential_policy = parse_policy(&value).ok_or_else(|| {
                        ConfigError::InvalidValue {
                            key: ENV_CREDENTIAL_POLICY,
                            value: value.clone(),
                        }
                    })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "data_file",
                value: String::new(),
            });
        }
        if self.users_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "users_file",
                value: String::new(),
            });
        }
        if self.session_timeout_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "session_timeout_secs",
                value: self.session_timeout_secs.to_string(),
            });
        }
        Ok(())
    }

    /// Configured level, or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

fn parse_policy(value: &str) -> Option<CredentialPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "any_user" => Some(CredentialPolicy::AnyUser),
        "match_username" => Some(CredentialPolicy::MatchUsername),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidValue {
        key: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => {
                write!(f, "invalid config value for `{key}`: `{value}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}
