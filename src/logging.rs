use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr so stdout carries only the report. `RUST_LOG` overrides the
/// default `cafe_clean=info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cafe_clean=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
