//! # Update Checker
//!
//! Advisory check for a newer release. At most one network request per
//! day: the latest version seen is cached next to the registry with the
//! time it was fetched.
//!
//! Nothing here ever fails outward. A missing or corrupt cache, a slow or
//! unreachable release endpoint, a malformed response: all of them simply
//! mean "no update available" for this run.

use crate::error::{LnbotError, Result};
use crate::store::fs::write_private;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const RELEASES_URL: &str = "https://api.github.com/repos/lnbotdev/cli/releases/latest";
const FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

pub fn check_interval() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCache {
    pub latest: String,
    /// Seconds since the unix epoch.
    pub checked_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCheck {
    /// Only set when a newer release exists.
    pub latest: Option<String>,
    pub available: bool,
}

impl UpdateCheck {
    fn compare(latest: &str, current: &str) -> Self {
        if !latest.is_empty() && is_newer(latest, current) {
            UpdateCheck {
                latest: Some(latest.to_string()),
                available: true,
            }
        } else {
            UpdateCheck::default()
        }
    }
}

/// Where the latest released version comes from.
pub trait ReleaseSource {
    fn latest_version(&self) -> Result<String>;
}

pub struct GithubReleases {
    url: String,
}

impl Default for GithubReleases {
    fn default() -> Self {
        Self {
            url: RELEASES_URL.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Release {
    tag_name: String,
}

impl ReleaseSource for GithubReleases {
    fn latest_version(&self) -> Result<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("lnbot-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let release = runtime.block_on(fetch_release(client, self.url.clone()))?;
        Ok(release
            .tag_name
            .strip_prefix('v')
            .unwrap_or(&release.tag_name)
            .to_string())
    }
}

async fn fetch_release(client: reqwest::Client, url: String) -> Result<Release> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(LnbotError::Transport(format!(
            "release check returned {}",
            response.status()
        )));
    }
    Ok(response.json::<Release>().await?)
}

pub struct UpdateChecker<R: ReleaseSource> {
    cache_path: PathBuf,
    disabled: bool,
    source: R,
    now: fn() -> DateTime<Utc>,
}

impl UpdateChecker<GithubReleases> {
    pub fn new(cache_path: impl Into<PathBuf>, disabled: bool) -> Self {
        Self::with_source(cache_path, disabled, GithubReleases::default())
    }
}

impl<R: ReleaseSource> UpdateChecker<R> {
    pub fn with_source(cache_path: impl Into<PathBuf>, disabled: bool, source: R) -> Self {
        Self {
            cache_path: cache_path.into(),
            disabled,
            source,
            now: Utc::now,
        }
    }

    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn check(&self, current: &str) -> UpdateCheck {
        if self.disabled {
            return UpdateCheck::default();
        }
        let now = (self.now)();

        if let Some(cache) = self.read_cache() {
            let checked_at = DateTime::from_timestamp(cache.checked_at, 0);
            if let Some(checked_at) = checked_at {
                if now.signed_duration_since(checked_at) < check_interval() {
                    log::debug!("update cache fresh, latest {}", cache.latest);
                    return UpdateCheck::compare(&cache.latest, current);
                }
            }
        }

        let latest = match self.source.latest_version() {
            Ok(latest) => latest,
            Err(e) => {
                log::debug!("update check failed: {}", e);
                return UpdateCheck::default();
            }
        };
        let cache = UpdateCache {
            latest: latest.clone(),
            checked_at: now.timestamp(),
        };
        if let Err(e) = self.write_cache(&cache) {
            log::debug!("could not write update cache: {}", e);
        }
        UpdateCheck::compare(&latest, current)
    }

    fn read_cache(&self) -> Option<UpdateCache> {
        let content = fs::read_to_string(&self.cache_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_cache(&self, cache: &UpdateCache) -> Result<()> {
        let dir = self
            .cache_path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        write_private(dir, &self.cache_path, cache)
    }
}

/// Whether `latest` is a strictly higher `major.minor.patch` than `current`.
pub fn is_newer(latest: &str, current: &str) -> bool {
    parse_version(latest) > parse_version(current)
}

fn parse_version(version: &str) -> [u64; 3] {
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut out = [0; 3];
    for (slot, part) in out.iter_mut().zip(version.splitn(3, '.')) {
        *slot = part.parse().unwrap_or(0);
    }
    out
}
