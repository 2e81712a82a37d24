//! Log subscriber setup for the binary

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter directive for a verbosity level.
///
/// `-q` maps to -1; each `-v` adds one.
pub fn default_directive(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "sheet2json=warn",
        0 => "sheet2json=info",
        1 => "sheet2json=debug",
        _ => "sheet2json=trace",
    }
}

/// Initializes console logging on stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
pub fn init_logging(verbosity: i8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
