use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_ENV: &str = "KVBENCH_LOG";
const FALLBACK_LOG_ENV: &str = "RUST_LOG";

/// Installs the global subscriber. Log lines go to stderr so stdout only
/// carries the result summary.
pub fn init_logging(verbose: bool, no_color: bool) {
    let directive = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var(FALLBACK_LOG_ENV).ok(),
        verbose,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid log filter '{}': {}", directive, err);
        EnvFilter::new(default_level(verbose))
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

fn filter_directive(own: Option<String>, fallback: Option<String>, verbose: bool) -> String {
    own.or(fallback)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_level(verbose).to_owned())
}

const fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}
