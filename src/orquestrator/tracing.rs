use sentry::ClientInitGuard;
use sentry_tracing::EventFilter;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Env;

/// Installs the global subscriber. The returned guard flushes sentry on drop.
pub fn init_tracing(env: &Env, sentry_token: Option<&str>) -> Option<ClientInitGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let (json, pretty) = match env {
        Env::Production => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .log_internal_errors(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_span_list(true)
                    .with_target(true),
            ),
            None,
        ),
        Env::Development | Env::Test => (
            None,
            Some(tracing_subscriber::fmt::layer().pretty().with_target(true)),
        ),
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty);

    let Some(token) = sentry_token else {
        registry.init();
        return None;
    };

    let guard = sentry::init((
        token,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(env.to_string().into()),
            debug: matches!(env, Env::Development | Env::Test),
            ..Default::default()
        },
    ));

    let sentry_layer = sentry_tracing::layer().event_filter(|md| match *md.level() {
        tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
        _ => EventFilter::Ignore,
    });

    registry.with(sentry_layer).init();
    Some(guard)
}
