use std::path::PathBuf;

use clap::{Args, builder::BoolishValueParser};
use url::Url;

/// Configuration overrides accepted on the command line. They take precedence
/// over every file and environment source.
#[derive(Debug, Args, Default, Clone)]
pub struct ConfigOverrides {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "MOTORHUB_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Override the REST API base URL (e.g. http://localhost:8000/api/).
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<Url>,

    /// Override the origin used to build public image URLs.
    #[arg(long = "api-asset-url", value_name = "URL", global = true)]
    pub api_asset_url: Option<Url>,

    /// Override the per-request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// Override where the session token is persisted.
    #[arg(long = "session-token-path", value_name = "PATH", global = true)]
    pub session_token_path: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Toggle event-driven cache invalidation.
    #[arg(
        long = "cache-enable",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enable: Option<bool>,

    /// Override the search debounce window.
    #[arg(long = "cache-search-debounce-ms", value_name = "MILLIS", global = true)]
    pub cache_search_debounce_ms: Option<u64>,

    /// Toggle rollback of optimistic toggles on failure.
    #[arg(
        long = "cache-rollback-on-failure",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_rollback_on_failure: Option<bool>,
}
