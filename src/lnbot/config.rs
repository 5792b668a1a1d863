use directories::BaseDirs;
use std::env;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "LNBOT_CONFIG";
pub const NO_UPDATE_CHECK_ENV: &str = "LNBOT_NO_UPDATE_CHECK";
pub const API_URL_ENV: &str = "LNBOT_API_URL";
pub const LOG_ENV: &str = "LNBOT_LOG";

pub const DEFAULT_API_URL: &str = "https://api.ln.bot";

const CONFIG_FILENAME: &str = "config.json";
const UPDATE_CACHE_FILENAME: &str = ".update-check";

/// Per-invocation settings, resolved once from the environment and handed
/// to every component that needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where the wallet registry lives
    pub registry_path: PathBuf,

    /// Where the update checker keeps its advisory cache
    pub update_cache_path: PathBuf,

    /// Base URL of the wallet service
    pub api_url: String,

    pub update_check_disabled: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup, so tests never
    /// have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = config_dir();
        let registry_path = lookup(CONFIG_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join(CONFIG_FILENAME));
        let api_url = lookup(API_URL_ENV)
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let update_check_disabled = lookup(NO_UPDATE_CHECK_ENV)
            .map(|v| !v.is_empty())
            .unwrap_or(false);

        Self {
            registry_path,
            update_cache_path: base.join(UPDATE_CACHE_FILENAME),
            api_url,
            update_check_disabled,
        }
    }
}

/// `~/.config/lnbot`, shared by every platform so credentials written by
/// older releases keep resolving.
pub fn config_dir() -> PathBuf {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("lnbot")
}
