use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber on stderr; stdout stays free.
pub fn init_tracing(verbose: bool, json_output: bool) {
    let default_filter = if verbose {
        "info,dialfeed=debug"
    } else {
        "info,dialfeed=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
