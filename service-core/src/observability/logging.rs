use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `RUST_LOG` overrides `log_level`;
/// `LOG_FORMAT=pretty` switches from JSON lines to human-readable output.
pub fn init_tracing(service_name: &str, log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let pretty = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if pretty {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .init();
    }

    tracing::info!(service = %service_name, "Tracing initialized");
}
