//! Tracing subscriber setup.
//!
//! Both formats feed the same Sentry layer: warnings and errors become
//! events, info and debug become breadcrumbs.

use sentry::integrations::tracing as sentry_tracing;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "optica_storefront=info,tower_http=debug";

/// Filter tracing events to Sentry event types.
#[must_use]
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Build the subscriber for `format`.
///
/// `RUST_LOG` overrides the default filter.
#[must_use]
pub fn subscriber(format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    match format {
        LogFormat::Pretty => Box::new(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(sentry_tracing::layer().event_filter(sentry_event_filter)),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .with(sentry_tracing::layer().event_filter(sentry_event_filter)),
        ),
    }
}
