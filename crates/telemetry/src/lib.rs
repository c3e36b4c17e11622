//! Tracing subscriber bootstrap driven by [`TelemetrySettings`].

use shelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stdout.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init(settings: &TelemetrySettings) {
    install(settings, std::io::stdout);
}

/// Same as [`init`] but writes to stderr, leaving stdout to command output.
pub fn init_stderr(settings: &TelemetrySettings) {
    install(settings, std::io::stderr);
}

fn install<W>(settings: &TelemetrySettings, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_filter(settings);

    let installed = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_current_span(false)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(
            target: "shelf-telemetry",
            format = ?settings.log_format,
            level = %settings.level,
            "telemetry initialized"
        );
    }
}

fn build_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
