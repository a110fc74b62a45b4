//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::ConfigOverrides;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "motorhub";
const ENV_PREFIX: &str = "MOTORHUB";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";
const DEFAULT_ASSET_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_PATH: &str = "motorhub-session.json";
const DEFAULT_COLLECTION_LIMIT: u64 = 64;
const DEFAULT_QUERY_LIMIT: u64 = 256;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_CONSUME_BATCH_LIMIT: u64 = 100;

/// Fully-resolved client settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Always ends with `/` so endpoint paths join beneath it.
    pub base_url: Url,
    pub asset_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub token_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub collection_limit: NonZeroUsize,
    pub query_limit: NonZeroUsize,
    pub search_debounce: Duration,
    pub rollback_on_failure: bool,
    pub consume_batch_limit: NonZeroUsize,
    pub viewport_root_margin: f32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(overrides: &ConfigOverrides) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = overrides.config_file.as_deref() {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(overrides);
    Settings::from_raw(raw)
}

/// Load a single file with no other sources; used by tests and tooling.
pub fn load_file(path: &Path) -> Result<Settings, LoadError> {
    let raw: RawSettings = Config::builder()
        .add_source(File::from(path).required(true))
        .build()?
        .try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    session: RawSessionSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.to_string());
        }
        if let Some(url) = overrides.api_asset_url.as_ref() {
            self.api.asset_url = Some(url.to_string());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(path) = overrides.session_token_path.as_ref() {
            self.session.token_path = Some(path.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enable) = overrides.cache_enable {
            self.cache.enable = Some(enable);
        }
        if let Some(millis) = overrides.cache_search_debounce_ms {
            self.cache.search_debounce_ms = Some(millis);
        }
        if let Some(rollback) = overrides.cache_rollback_on_failure {
            self.cache.rollback_on_failure = Some(rollback);
        }
    }
}

impl Settings {
    /// Built-in defaults with no file, environment or CLI input.
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_raw(RawSettings::default())
    }

    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            session,
            logging,
            cache,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            session: build_session_settings(session)?,
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_url = parse_directory_url(
        api.base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL),
        "api.base_url",
    )?;
    let asset_url = parse_directory_url(
        api.asset_url.as_deref().unwrap_or(DEFAULT_ASSET_URL),
        "api.asset_url",
    )?;

    let timeout_seconds = api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ApiSettings {
        base_url,
        asset_url,
        timeout: Duration::from_secs(timeout_seconds),
    })
}

fn build_session_settings(session: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let token_path = session
        .token_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH));
    if token_path.as_os_str().is_empty() {
        return Err(LoadError::invalid("session.token_path", "must not be empty"));
    }
    Ok(SessionSettings { token_path })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let viewport_root_margin = cache.viewport_root_margin.unwrap_or(0.0);
    if !viewport_root_margin.is_finite() || viewport_root_margin < 0.0 {
        return Err(LoadError::invalid(
            "cache.viewport_root_margin",
            "must be a finite, non-negative number",
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enable.unwrap_or(true),
        collection_limit: non_zero_usize(
            cache.collection_limit.unwrap_or(DEFAULT_COLLECTION_LIMIT),
            "cache.collection_limit",
        )?,
        query_limit: non_zero_usize(
            cache.query_limit.unwrap_or(DEFAULT_QUERY_LIMIT),
            "cache.query_limit",
        )?,
        search_debounce: Duration::from_millis(
            cache
                .search_debounce_ms
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS),
        ),
        rollback_on_failure: cache.rollback_on_failure.unwrap_or(true),
        consume_batch_limit: non_zero_usize(
            cache
                .consume_batch_limit
                .unwrap_or(DEFAULT_CONSUME_BATCH_LIMIT),
            "cache.consume_batch_limit",
        )?,
        viewport_root_margin,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    asset_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    token_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enable: Option<bool>,
    collection_limit: Option<u64>,
    query_limit: Option<u64>,
    search_debounce_ms: Option<u64>,
    rollback_on_failure: Option<bool>,
    consume_batch_limit: Option<u64>,
    viewport_root_margin: Option<f32>,
}

/// Parse an absolute http(s) URL and make sure its path ends with `/`.
fn parse_directory_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let mut url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "scheme must be http or https"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
