//! Logging setup

use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;

/// Map a `RUST_LOG`-style level name to a tracing level (default INFO)
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber.
///
/// JSON on stderr when `log_json` is set, ANSI text on stdout otherwise.
/// Returns `false` if a subscriber was already installed.
pub fn init(config: &Config) -> bool {
    let level = parse_level(&config.log_level);

    let installed = if config.log_json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    };

    if !installed {
        debug!("Global subscriber already installed");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level(" DEBUG "), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_second_init_is_harmless() {
        let config = Config::default();
        let first = init(&config);
        assert!(!init(&config));
        let _ = first;
    }
}
