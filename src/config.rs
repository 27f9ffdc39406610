//! Portal configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::i18n::Lang;
use crate::net::HttpTimeouts;
use crate::views::demandes::StatusRevertPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STORE_PATH: &str = ".portail/session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}='{value}': expected {expected}")]
    Invalid { var: &'static str, value: String, expected: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub store_path: PathBuf,
    pub lang: Lang,
    pub status_revert: StatusRevertPolicy,
    pub timeouts: HttpTimeouts,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            lang: Lang::default(),
            status_revert: StatusRevertPolicy::default(),
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl PortalConfig {
    /// Build config from environment variables.
    ///
    /// All optional:
    /// - `PORTAIL_API_BASE_URL`: backend root, default `http://localhost:8000`
    /// - `PORTAIL_STORE_PATH`: session file, default `.portail/session.json`
    /// - `PORTAIL_LANG`: `fr` (default) or `en`
    /// - `PORTAIL_STATUS_REVERT`: `keep` (default) or `revert`
    /// - `PORTAIL_REQUEST_TIMEOUT_SECS`, `PORTAIL_CONNECT_TIMEOUT_SECS`: unset
    ///   means wait indefinitely
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("PORTAIL_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned();
        let store_path = lookup("PORTAIL_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);

        let lang = match lookup("PORTAIL_LANG") {
            Some(raw) => raw.parse::<Lang>().map_err(|_| ConfigError::Invalid {
                var: "PORTAIL_LANG",
                value: raw,
                expected: "'fr' or 'en'",
            })?,
            None => Lang::default(),
        };
        let status_revert = match lookup("PORTAIL_STATUS_REVERT") {
            Some(raw) => StatusRevertPolicy::parse(&raw).ok_or(ConfigError::Invalid {
                var: "PORTAIL_STATUS_REVERT",
                value: raw,
                expected: "'keep' or 'revert'",
            })?,
            None => StatusRevertPolicy::default(),
        };
        let timeouts = HttpTimeouts {
            request: parse_secs(&lookup, "PORTAIL_REQUEST_TIMEOUT_SECS")?,
            connect: parse_secs(&lookup, "PORTAIL_CONNECT_TIMEOUT_SECS")?,
        };

        Ok(Self { api_base_url, store_path, lang, status_revert, timeouts })
    }
}

fn parse_secs<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid { var, value: raw, expected: "a positive number of seconds" }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
