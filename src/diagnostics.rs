//! Diagnostic logging for the pipeline itself.
//!
//! Telemetry artifacts go through the [`LogSink`](crate::sink::LogSink);
//! everything the pipeline has to say about its own health (setup
//! degradation, dropped artifacts, failed rotations) goes through `tracing`
//! and lands wherever the host process points its subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a tracing subscriber with an env-filter (default directive
/// `telemetry_pipeline=info`). Safe to call more than once; later calls are
/// no-ops when a global subscriber already exists.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telemetry_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
