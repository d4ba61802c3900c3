//! Tracing bootstrap.

use tracing_subscriber::{fmt, EnvFilter};

/// Directive used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `fallback`. Returns false if a subscriber was
/// already installed.
pub fn init_tracing(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Filter directive for a `-v` count.
pub fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => DEFAULT_FILTER,
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(verbosity_filter(0), "info");
        assert_eq!(verbosity_filter(1), "debug");
        assert_eq!(verbosity_filter(7), "trace");
    }

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing("warn");
        assert!(!init_tracing("warn"));
    }
}
