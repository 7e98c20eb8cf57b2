//! Log output for the `lineq` binary.
//!
//! Events go to stderr so they never mix with query output on stdout.
//! `RUST_LOG` wins when set; otherwise the level comes from `-v` flags.

use tracing_subscriber::{EnvFilter, fmt};

/// Level used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "lineq=warn",
        1 => "lineq=info",
        2 => "lineq=debug",
        _ => "lineq=trace",
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "lineq=warn");
        assert_eq!(default_directive(2), "lineq=debug");
        assert_eq!(default_directive(9), "lineq=trace");
    }
}
