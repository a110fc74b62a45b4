use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "motorhub_page_fetch_total",
            Unit::Count,
            "Total number of page fetches, labelled by collection and result."
        );
        describe_histogram!(
            "motorhub_page_fetch_ms",
            Unit::Milliseconds,
            "Page fetch latency in milliseconds."
        );
        describe_counter!(
            "motorhub_cache_invalidated_total",
            Unit::Count,
            "Total number of cache entries invalidated by mutation events."
        );
        describe_counter!(
            "motorhub_cache_evict_total",
            Unit::Count,
            "Total number of collection entries evicted due to capacity."
        );
        describe_counter!(
            "motorhub_query_hit_total",
            Unit::Count,
            "Total number of query loads answered from the cache."
        );
        describe_counter!(
            "motorhub_query_miss_total",
            Unit::Count,
            "Total number of query loads that went to the network."
        );
        describe_counter!(
            "motorhub_optimistic_rollback_total",
            Unit::Count,
            "Total number of optimistic toggles undone after a failed call."
        );
        describe_gauge!(
            "motorhub_cache_event_queue_len",
            Unit::Count,
            "Current number of pending cache events in the queue."
        );
        describe_histogram!(
            "motorhub_cache_consume_ms",
            Unit::Milliseconds,
            "Cache event consumption latency in milliseconds."
        );
    });
}
